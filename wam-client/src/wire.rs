//! Request encoding for command connections

use wam_api::Command;

use crate::config::ClientConfig;

/// Full request written on a command connection
///
/// The device expects its client metadata after the blank line that would
/// end an HTTP header block.
pub fn encode_request(command: &Command, ip: &str, config: &ClientConfig) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}:{}\r\n\r\nmobileUUID: {}\r\nmobileName: {}\r\nmobileVersion: {}\r\n\r\n",
        command.url(),
        ip,
        config.port,
        config.user,
        config.client_name,
        config.client_version,
    )
}
