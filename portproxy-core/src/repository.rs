//! Port proxy rule repository
//!
//! Stateless facade over the external utility: every call goes back to the OS table,
//! nothing is cached between calls.

use crate::encoder::{build_add_args, build_delete_args, build_list_args};
use crate::error::{PortProxyError, Result};
use crate::invoker::{CommandInvoker, CommandOutput};
use crate::parser::parse_listing;
use crate::rule::{AddOptions, Rule, RuleGroup, RuleKey};

/// Default network configuration utility
pub const DEFAULT_PROGRAM: &str = "netsh";

pub struct PortProxyRepository<I> {
    invoker: I,
    program: String,
}

impl<I: CommandInvoker> PortProxyRepository<I> {
    /// Create a repository that drives `netsh` through `invoker`
    pub fn new(invoker: I) -> Self {
        Self::with_program(invoker, DEFAULT_PROGRAM)
    }

    pub fn with_program(invoker: I, program: impl Into<String>) -> Self {
        Self {
            invoker,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Read the full rule table
    ///
    /// A non-zero exit is an [`PortProxyError::ExternalCommand`] carrying the
    /// utility's output verbatim.
    pub async fn list(&self) -> Result<Vec<Rule>> {
        let output = self.invoke(build_list_args()).await?;

        if !output.success() {
            tracing::warn!("{} listing exited with {}", self.program, output.exit_code);
            return Err(PortProxyError::ExternalCommand {
                code: output.exit_code,
                stdout: output.stdout,
            });
        }

        let rules = parse_listing(&output.stdout)?;
        tracing::debug!("Parsed {} port proxy rules", rules.len());
        Ok(rules)
    }

    /// Add a rule. The exit code is returned as-is for the caller to judge.
    pub async fn add(
        &self,
        group: RuleGroup,
        listen_port: u16,
        connect_address: &str,
        options: &AddOptions,
    ) -> Result<CommandOutput> {
        self.invoke(build_add_args(group, listen_port, connect_address, options))
            .await
    }

    /// Delete the rule identified by `key`. The exit code is returned as-is.
    pub async fn delete(&self, key: &RuleKey) -> Result<CommandOutput> {
        self.invoke(build_delete_args(key)).await
    }

    async fn invoke(&self, args: Vec<String>) -> Result<CommandOutput> {
        tracing::debug!("Running {} {:?}", self.program, args);
        self.invoker.run(&self.program, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::scripted::ScriptedInvoker;

    const LISTING: &str = "\r\n\
ipv4 をリッスンする:         ipv4 に接続する:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
*               50022       172.23.67.210   50022\r\n\
\r\n\
ipv6 をリッスンする:         ipv6 に接続する:\r\n\
\r\n\
Address         Port        Address         Port\r\n\
--------------- ----------  --------------- ----------\r\n\
*               8001        192.168.10.100  8001\r\n";

    #[tokio::test]
    async fn test_list_runs_show_all() {
        let invoker = ScriptedInvoker::new().respond(0, LISTING);
        let repo = PortProxyRepository::new(&invoker);

        let rules = repo.list().await.unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].group, RuleGroup::V4ToV4);
        assert_eq!(rules[0].listen_address, "*");
        assert_eq!(rules[1].group, RuleGroup::V6ToV6);
        assert_eq!(rules[1].connect_address, "192.168.10.100");

        let calls = invoker.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "netsh");
        assert_eq!(calls[0].1, ["interface", "portproxy", "show", "all"]);
    }

    #[tokio::test]
    async fn test_list_empty_table() {
        let invoker = ScriptedInvoker::new().respond(0, "\r\n");
        let repo = PortProxyRepository::new(&invoker);

        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_nonzero_exit_is_error() {
        let invoker = ScriptedInvoker::new().respond(1, "要求された操作には管理者特権が必要です。");
        let repo = PortProxyRepository::new(&invoker);

        match repo.list().await.unwrap_err() {
            PortProxyError::ExternalCommand { code, stdout } => {
                assert_eq!(code, 1);
                assert_eq!(stdout, "要求された操作には管理者特権が必要です。");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_malformed_output() {
        let invoker = ScriptedInvoker::new().respond(0, "*  8080  10.0.0.5  8080\n");
        let repo = PortProxyRepository::new(&invoker);

        assert!(matches!(
            repo.list().await,
            Err(PortProxyError::MalformedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn test_launch_error_propagates() {
        let invoker = ScriptedInvoker::new().fail(PortProxyError::Launch {
            program: "netsh".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        let repo = PortProxyRepository::new(&invoker);

        assert!(matches!(repo.list().await, Err(PortProxyError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_add_passes_result_through() {
        let invoker = ScriptedInvoker::new().respond(1, "オブジェクトは既に存在します。");
        let repo = PortProxyRepository::with_program(&invoker, "netsh.exe");

        let options = AddOptions {
            connect_port: Some(22),
            listen_address: None,
        };
        let output = repo
            .add(RuleGroup::V4ToV4, 2222, "172.23.67.210", &options)
            .await
            .unwrap();

        assert_eq!(output.exit_code, 1);
        assert_eq!(output.stdout, "オブジェクトは既に存在します。");

        let calls = invoker.calls();
        assert_eq!(calls[0].0, "netsh.exe");
        assert_eq!(
            calls[0].1,
            [
                "interface",
                "portproxy",
                "add",
                "v4tov4",
                "listenport=2222",
                "connectaddress=172.23.67.210",
                "connectport=22",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_nonzero_is_not_an_error() {
        let invoker = ScriptedInvoker::new().respond(1, "anything at all\r\n");
        let repo = PortProxyRepository::new(&invoker);

        let key = RuleKey {
            group: RuleGroup::V6ToV6,
            listen_port: 8001,
            listen_address: Some("*".to_string()),
        };
        let output = repo.delete(&key).await.unwrap();

        assert_eq!(
            output,
            CommandOutput {
                exit_code: 1,
                stdout: "anything at all\r\n".to_string(),
            }
        );
        assert_eq!(
            invoker.calls()[0].1,
            [
                "interface",
                "portproxy",
                "delete",
                "v6tov6",
                "listenport=8001",
                "listenaddress=*",
            ]
        );
    }
}
