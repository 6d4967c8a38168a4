use crate::utils::error::{AppError, AppResult};
use crossterm::terminal::size;
use std::io::IsTerminal;

/// Get terminal size (rows, columns)
pub fn get_terminal_size() -> AppResult<(u16, u16)> {
    size()
        .map(|(width, height)| (height, width))
        .map_err(|e| AppError::System(format!("Failed to get terminal size: {}", e)))
}

/// Check if content should be paginated based on terminal height
pub fn should_paginate(content: &str, terminal_height: u16) -> bool {
    let line_count = content.lines().count();
    // Use pagination if content exceeds 2/3 of terminal height
    line_count > (terminal_height as usize * 2 / 3)
}

/// Display content using minus pager for static content
pub fn paginate_static_content(content: &str) -> AppResult<()> {
    let pager = minus::Pager::new();
    pager
        .push_str(content)
        .map_err(|e| AppError::System(format!("Failed to push content to pager: {}", e)))?;

    if let Err(e) = minus::page_all(pager) {
        // User quitting the pager is not an error
        if e.to_string().to_lowercase().contains("abort") {
            return Ok(());
        }
        return Err(AppError::System(format!("Failed to run pager: {}", e)));
    }

    Ok(())
}

/// Print to stdout, or page when stdout is a terminal and the content is long
pub fn print_or_page(content: &str) -> AppResult<()> {
    if std::io::stdout().is_terminal() {
        if let Ok((rows, _)) = get_terminal_size() {
            if should_paginate(content, rows) {
                return paginate_static_content(content);
            }
        }
    }
    print!("{}", content);
    Ok(())
}
