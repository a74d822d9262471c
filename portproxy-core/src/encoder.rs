//! Argument vectors for netsh port proxy commands
//!
//! Every token is handed to the invoker as a discrete argument. Nothing is quoted or
//! escaped here; the invoker never goes through a shell.

use crate::rule::{AddOptions, RuleGroup, RuleKey};

/// Sub-facility prefix shared by every port proxy command
pub const PORTPROXY_PREFIX: [&str; 2] = ["interface", "portproxy"];

/// `interface portproxy show all`
pub fn build_list_args() -> Vec<String> {
    let mut args = prefix();
    args.push("show".to_string());
    args.push("all".to_string());
    args
}

/// `interface portproxy add <group> listenport=N connectaddress=A [connectport=N] [listenaddress=A]`
///
/// Field order is fixed; netsh rejects reordered arguments for some groups.
pub fn build_add_args(
    group: RuleGroup,
    listen_port: u16,
    connect_address: &str,
    options: &AddOptions,
) -> Vec<String> {
    let mut args = prefix();
    args.push("add".to_string());
    args.push(group.as_str().to_string());
    args.push(format!("listenport={listen_port}"));
    args.push(format!("connectaddress={connect_address}"));

    if let Some(port) = options.connect_port {
        args.push(format!("connectport={port}"));
    }
    if let Some(address) = &options.listen_address {
        args.push(format!("listenaddress={address}"));
    }

    args
}

/// `interface portproxy delete <group> listenport=N [listenaddress=A]`
pub fn build_delete_args(key: &RuleKey) -> Vec<String> {
    let mut args = prefix();
    args.push("delete".to_string());
    args.push(key.group.as_str().to_string());
    args.push(format!("listenport={}", key.listen_port));

    if let Some(address) = &key.listen_address {
        args.push(format!("listenaddress={address}"));
    }

    args
}

fn prefix() -> Vec<String> {
    PORTPROXY_PREFIX.iter().map(|s| s.to_string()).collect()
}
