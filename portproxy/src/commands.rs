//! Subcommand handlers
//!
//! Every handler works against the live table: rules are re-listed whenever an
//! index has to be resolved, and after changes unless refreshing is disabled.

use crate::table;
use anyhow::{bail, Context, Result};
use portproxy_core::{
    AddOptions, CommandInvoker, CommandOutput, PortProxyRepository, Rule, RuleGroup, RuleKey,
};
use std::collections::HashSet;
use std::io::{self, BufRead, Write};

/// Fields of a rule to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRule {
    pub group: RuleGroup,
    pub listen_port: u16,
    pub connect_address: String,
    pub options: AddOptions,
}

impl NewRule {
    /// Template taken from an existing rule, as the "copy" action does
    pub fn from_template(template: &Rule, listen_port: u16, connect_port: Option<u16>) -> Self {
        Self {
            group: template.group,
            listen_port,
            connect_address: template.connect_address.clone(),
            options: AddOptions {
                connect_port,
                listen_address: Some(template.listen_address.clone()),
            },
        }
    }
}

/// Changes applied to an existing rule by `replace`; unset fields are kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleEdit {
    pub group: Option<RuleGroup>,
    pub listen_address: Option<String>,
    pub listen_port: Option<u16>,
    pub connect_address: Option<String>,
    pub connect_port: Option<u16>,
}

impl RuleEdit {
    pub fn apply(&self, current: &Rule) -> NewRule {
        NewRule {
            group: self.group.unwrap_or(current.group),
            listen_port: self.listen_port.unwrap_or(current.listen_port),
            connect_address: self
                .connect_address
                .clone()
                .unwrap_or_else(|| current.connect_address.clone()),
            options: AddOptions {
                connect_port: Some(self.connect_port.unwrap_or(current.connect_port)),
                listen_address: Some(
                    self.listen_address
                        .clone()
                        .unwrap_or_else(|| current.listen_address.clone()),
                ),
            },
        }
    }
}

/// How rules to delete are chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// 1-based positions in the current listing
    Indices(Vec<usize>),
    Key(RuleKey),
}

pub struct Commands<I> {
    repo: PortProxyRepository<I>,
    refresh: bool,
}

impl<I: CommandInvoker> Commands<I> {
    pub fn new(repo: PortProxyRepository<I>, refresh: bool) -> Self {
        Self { repo, refresh }
    }

    pub async fn list(&self) -> Result<i32> {
        let rules = self.repo.list().await.context("Failed to list port proxy rules")?;
        print!("{}", table::render(&rules));
        Ok(0)
    }

    pub async fn add(&self, rule: &NewRule) -> Result<i32> {
        let output = self
            .repo
            .add(rule.group, rule.listen_port, &rule.connect_address, &rule.options)
            .await
            .context("Failed to add port proxy rule")?;

        let code = report(&output, "Rule added");
        self.refresh_after(code).await
    }

    pub async fn copy(
        &self,
        index: usize,
        listen_port: u16,
        connect_port: Option<u16>,
    ) -> Result<i32> {
        let rules = self.repo.list().await.context("Failed to list port proxy rules")?;
        let template = select(&rules, index)?;
        tracing::debug!("Copying {}", table::describe(template));

        self.add(&NewRule::from_template(template, listen_port, connect_port))
            .await
    }

    pub async fn delete(&self, target: DeleteTarget, confirm: bool) -> Result<i32> {
        let keys: Vec<(String, RuleKey)> = match target {
            DeleteTarget::Key(key) => vec![(describe_key(&key), key)],
            DeleteTarget::Indices(indices) => {
                let rules = self.repo.list().await.context("Failed to list port proxy rules")?;
                resolve_indices(&rules, &indices)?
            }
        };

        if confirm {
            println!("The following port proxy rules will be deleted:");
            for (description, _) in &keys {
                println!("  {description}");
            }
            if !prompt_yes_no("Delete?")? {
                println!("Cancelled");
                return Ok(0);
            }
        }

        let mut code = 0;
        for (description, key) in &keys {
            let output = self
                .repo
                .delete(key)
                .await
                .with_context(|| format!("Failed to delete {description}"))?;
            let status = report(&output, &format!("Deleted {description}"));
            if status != 0 {
                code = status;
            }
        }

        self.refresh_after(code).await
    }

    /// Delete the rule at `index`, then add its edited version
    ///
    /// Not atomic: if the add fails the old rule is already gone.
    pub async fn replace(&self, index: usize, edit: &RuleEdit, confirm: bool) -> Result<i32> {
        let rules = self.repo.list().await.context("Failed to list port proxy rules")?;
        let current = select(&rules, index)?;
        let replacement = edit.apply(current);

        if confirm {
            println!("Replacing {}", table::describe(current));
            if !prompt_yes_no("Continue?")? {
                println!("Cancelled");
                return Ok(0);
            }
        }

        let output = self
            .repo
            .delete(&current.key())
            .await
            .context("Failed to delete port proxy rule")?;
        let code = report(&output, "Old rule deleted");
        if code != 0 {
            return Ok(code);
        }

        let output = self
            .repo
            .add(
                replacement.group,
                replacement.listen_port,
                &replacement.connect_address,
                &replacement.options,
            )
            .await
            .context("Failed to add replacement rule")?;
        let code = report(&output, "Replacement rule added");
        if code != 0 {
            eprintln!("The original rule was removed and the replacement was not added");
        }

        self.refresh_after(code).await
    }

    /// Show the table again; a failure here never hides the change's exit code
    async fn refresh_after(&self, code: i32) -> Result<i32> {
        if self.refresh {
            if let Err(e) = self.list().await {
                tracing::warn!("Failed to refresh the rule table: {:#}", e);
            }
        }
        Ok(code)
    }
}

/// Pick the rule at a 1-based listing position
pub fn select(rules: &[Rule], index: usize) -> Result<&Rule> {
    if index == 0 || index > rules.len() {
        bail!(
            "No rule at index {} ({} rules configured)",
            index,
            rules.len()
        );
    }
    Ok(&rules[index - 1])
}

/// Resolve listing positions to rule keys, each rule at most once, in the order given
pub fn resolve_indices(rules: &[Rule], indices: &[usize]) -> Result<Vec<(String, RuleKey)>> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for &index in indices {
        let rule = select(rules, index)?;
        if seen.insert(index) {
            keys.push((table::describe(rule), rule.key()));
        }
    }

    Ok(keys)
}

/// Print the outcome of a mutation and return the exit code to propagate
fn report(output: &CommandOutput, success_message: &str) -> i32 {
    if output.success() {
        println!("{success_message}");
    } else {
        eprintln!("netsh exited with code {}", output.exit_code);
        let text = output.stdout.trim();
        if !text.is_empty() {
            eprintln!("{text}");
        }
    }
    output.exit_code
}

fn describe_key(key: &RuleKey) -> String {
    format!(
        "{} {}:{}",
        key.group,
        key.listen_address.as_deref().unwrap_or("(default)"),
        key.listen_port
    )
}

fn prompt_yes_no(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
