//! Classification of what the radio hands us

use meshtastic::Message;
use meshtastic::protobufs::{
    Data, FromRadio, MeshPacket, MyNodeInfo, PortNum, User, from_radio, mesh_packet,
};

const NON_UTF8_TEXT: &str = "Non-utf8 msg";

#[derive(Debug, Clone, PartialEq)]
pub enum ReceivedPacket {
    ConnectionClosed,
    MyInfo(MyNodeInfo),
    /// Entry from the radio's own node database
    NodeInfo { num: u32, user: User },
    /// A decoded packet heard on the mesh
    Mesh { packet: MeshPacket, payload: MeshPayload },
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshPayload {
    Text(String),
    NodeInfo(User),
    Routing(Data),
    Other(PortNum),
}

impl MeshPayload {
    pub fn port(&self) -> PortNum {
        match self {
            MeshPayload::Text(_) => PortNum::TextMessageApp,
            MeshPayload::NodeInfo(_) => PortNum::NodeinfoApp,
            MeshPayload::Routing(_) => PortNum::RoutingApp,
            MeshPayload::Other(port) => *port,
        }
    }

    fn decode(data: &Data) -> Self {
        let port = PortNum::try_from(data.portnum).unwrap_or(PortNum::UnknownApp);
        match port {
            PortNum::TextMessageApp => MeshPayload::Text(
                String::from_utf8(data.payload.clone())
                    .unwrap_or_else(|_| NON_UTF8_TEXT.to_string()),
            ),
            PortNum::NodeinfoApp => match User::decode(data.payload.as_slice()) {
                Ok(user) => MeshPayload::NodeInfo(user),
                Err(_) => MeshPayload::Other(port),
            },
            PortNum::RoutingApp => MeshPayload::Routing(data.clone()),
            other => MeshPayload::Other(other),
        }
    }
}

impl From<Option<FromRadio>> for ReceivedPacket {
    fn from(from_radio: Option<FromRadio>) -> Self {
        let Some(from_radio) = from_radio else {
            return ReceivedPacket::ConnectionClosed;
        };
        let Some(payload) = from_radio.payload_variant else {
            return ReceivedPacket::Other;
        };

        match payload {
            from_radio::PayloadVariant::MyInfo(info) => ReceivedPacket::MyInfo(info),
            from_radio::PayloadVariant::NodeInfo(node_info) => match node_info.user {
                Some(user) => ReceivedPacket::NodeInfo {
                    num: node_info.num,
                    user,
                },
                None => ReceivedPacket::Other,
            },
            from_radio::PayloadVariant::Packet(packet) => {
                let payload = match &packet.payload_variant {
                    Some(mesh_packet::PayloadVariant::Decoded(data)) => MeshPayload::decode(data),
                    _ => return ReceivedPacket::Other,
                };
                ReceivedPacket::Mesh { packet, payload }
            }
            _ => ReceivedPacket::Other,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use meshtastic::protobufs::NodeInfo;

    pub(crate) fn mesh(from: u32, to: u32, port: PortNum, payload: Vec<u8>) -> FromRadio {
        FromRadio {
            payload_variant: Some(from_radio::PayloadVariant::Packet(MeshPacket {
                from,
                to,
                payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                    portnum: port as i32,
                    payload,
                    ..Default::default()
                })),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    pub(crate) fn user(long: &str, short: &str) -> User {
        User {
            long_name: long.to_string(),
            short_name: short.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_closed_and_empty() {
        assert_eq!(ReceivedPacket::from(None), ReceivedPacket::ConnectionClosed);
        assert_eq!(ReceivedPacket::from(Some(FromRadio::default())), ReceivedPacket::Other);
    }

    #[test]
    fn test_text_message() {
        let radio = mesh(1, 2, PortNum::TextMessageApp, b"hello mesh".to_vec());
        let packet = ReceivedPacket::from(Some(radio));
        let ReceivedPacket::Mesh { packet, payload } = packet else {
            panic!("expected mesh packet");
        };
        assert_eq!(packet.from, 1);
        assert_eq!(packet.to, 2);
        assert_eq!(payload, MeshPayload::Text("hello mesh".to_string()));
    }

    #[test]
    fn test_non_utf8_text_is_replaced() {
        let radio = mesh(1, 2, PortNum::TextMessageApp, vec![0xff, 0xfe]);
        let packet = ReceivedPacket::from(Some(radio));
        assert!(matches!(
            packet,
            ReceivedPacket::Mesh { payload: MeshPayload::Text(ref msg), .. } if msg == NON_UTF8_TEXT
        ));
    }

    #[test]
    fn test_nodeinfo_payload_decodes_user() {
        let encoded = user("Ridge Relay", "RR").encode_to_vec();
        let radio = mesh(9, 0xffff_ffff, PortNum::NodeinfoApp, encoded);
        let packet = ReceivedPacket::from(Some(radio));
        assert!(matches!(
            packet,
            ReceivedPacket::Mesh { payload: MeshPayload::NodeInfo(ref u), .. }
                if u.long_name == "Ridge Relay"
        ));

        let garbage = ReceivedPacket::from(Some(mesh(9, 1, PortNum::NodeinfoApp, vec![0xff; 4])));
        assert!(matches!(
            garbage,
            ReceivedPacket::Mesh { payload: MeshPayload::Other(PortNum::NodeinfoApp), .. }
        ));
    }

    #[test]
    fn test_other_ports_keep_port_number() {
        let packet = ReceivedPacket::from(Some(mesh(3, 4, PortNum::PositionApp, vec![])));
        let ReceivedPacket::Mesh { payload, .. } = packet else {
            panic!("expected mesh packet");
        };
        assert_eq!(payload.port(), PortNum::PositionApp);

        let unknown = FromRadio {
            payload_variant: Some(from_radio::PayloadVariant::Packet(MeshPacket {
                payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                    portnum: 9999,
                    ..Default::default()
                })),
                ..Default::default()
            })),
            ..Default::default()
        };
        assert!(matches!(
            ReceivedPacket::from(Some(unknown)),
            ReceivedPacket::Mesh { payload: MeshPayload::Other(PortNum::UnknownApp), .. }
        ));
    }

    #[test]
    fn test_encrypted_packet_is_other() {
        let encrypted = FromRadio {
            payload_variant: Some(from_radio::PayloadVariant::Packet(MeshPacket {
                payload_variant: Some(mesh_packet::PayloadVariant::Encrypted(vec![1, 2, 3])),
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(ReceivedPacket::from(Some(encrypted)), ReceivedPacket::Other);
    }

    #[test]
    fn test_node_db_entry() {
        let with_user = FromRadio {
            payload_variant: Some(from_radio::PayloadVariant::NodeInfo(NodeInfo {
                num: 77,
                user: Some(user("Summit", "SMT")),
                ..Default::default()
            })),
            ..Default::default()
        };
        assert!(matches!(
            ReceivedPacket::from(Some(with_user)),
            ReceivedPacket::NodeInfo { num: 77, ref user } if user.short_name == "SMT"
        ));

        let without_user = FromRadio {
            payload_variant: Some(from_radio::PayloadVariant::NodeInfo(NodeInfo {
                num: 78,
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(ReceivedPacket::from(Some(without_user)), ReceivedPacket::Other);
    }
}
