//! Raw IP transports. TCP and UDP share one builder: the server url carries
//! host and port, so neither adds fields or binding values.

use super::ProtocolBuilder;

pub struct IpBuilder {
    name: &'static str,
    title: &'static str,
}

impl IpBuilder {
    pub fn tcp() -> Self {
        IpBuilder {
            name: "tcp",
            title: "TCP",
        }
    }

    pub fn udp() -> Self {
        IpBuilder {
            name: "udp",
            title: "UDP",
        }
    }
}

impl ProtocolBuilder for IpBuilder {
    fn protocol_name(&self) -> &'static str {
        self.name
    }

    fn protocol_title(&self) -> &'static str {
        self.title
    }
}
