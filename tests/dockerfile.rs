//! Structural checks on the ARM64 release build image

const DOCKERFILE: &str = include_str!("../Dockerfile");
const DOCKERIGNORE: &str = include_str!("../.dockerignore");

/// Instructions with comments dropped and `\` continuations joined
fn instructions() -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in DOCKERFILE.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_suffix('\\') {
            current.push_str(stripped.trim_end());
            current.push(' ');
        } else {
            current.push_str(line);
            out.push(std::mem::take(&mut current));
        }
    }
    out
}

fn find(keyword: &str) -> Vec<String> {
    instructions()
        .into_iter()
        .filter(|i| i.split_whitespace().next() == Some(keyword))
        .collect()
}

#[test]
fn test_base_image_is_arm64_rust() {
    let args = find("ARG");
    let image_arg = args
        .iter()
        .find(|a| a.starts_with("ARG RUST_IMAGE="))
        .expect("RUST_IMAGE build argument");
    assert!(image_arg.contains("arm64v8/rust"));

    let from = find("FROM");
    assert_eq!(from, vec!["FROM ${RUST_IMAGE}".to_string()]);
}

#[test]
fn test_installs_dbus_headers_and_pkg_config() {
    let run = find("RUN").join(" ");
    assert!(run.contains("apt-get install"));
    assert!(run.contains("libdbus-1-dev"));
    assert!(run.contains("pkg-config"));
}

#[test]
fn test_copies_context_into_build_dir() {
    assert_eq!(find("COPY"), vec!["COPY . /build".to_string()]);
    assert_eq!(find("WORKDIR"), vec!["WORKDIR /build".to_string()]);
}

#[test]
fn test_requests_line_tables_debug_info() {
    assert_eq!(find("ENV"), vec!["ENV RUSTFLAGS=\"-C debuginfo=1\"".to_string()]);
}

#[test]
fn test_default_command_is_aarch64_release_build() {
    let cmd = find("CMD");
    assert_eq!(cmd.len(), 1);
    assert_eq!(
        cmd[0],
        r#"CMD ["cargo", "build", "--release", "--target", "aarch64-unknown-linux-gnu"]"#
    );
}

#[test]
fn test_declares_no_ports_or_volumes() {
    assert!(find("EXPOSE").is_empty());
    assert!(find("VOLUME").is_empty());
}

#[test]
fn test_build_context_excludes_local_state() {
    let ignored: Vec<&str> = DOCKERIGNORE.lines().map(str::trim).collect();
    for entry in ["target/", ".env", "storage.json", "*.cbor"] {
        assert!(ignored.contains(&entry), "{} should be ignored", entry);
    }
}
