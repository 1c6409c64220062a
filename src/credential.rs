use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{debug, info};

use crate::config::API_KEY_VAR;

/// Secret token sent as the bearer credential on every completion request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty token.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

pub fn resolve_from_env() -> Result<Option<Credential>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    resolve_credential(|key| env::var(key).ok(), &mut input, &mut output)
}

/// Reads the credential from `API_KEY_VAR`, falling back to one interactive
/// line. `Ok(None)` means the operator declined to supply one.
pub fn resolve_credential(
    mut get_var: impl FnMut(&str) -> Option<String>,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Option<Credential>> {
    if let Some(credential) = get_var(API_KEY_VAR).and_then(Credential::new) {
        debug!(source = "environment", "resolved api credential");
        return Ok(Some(credential));
    }

    info!(var = API_KEY_VAR, "api credential missing from environment");
    print_missing_credential_help(output)?;
    write!(output, "Enter your OpenAI API key (or press Enter to exit): ")
        .context("Failed to write credential prompt")?;
    output.flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read credential from stdin")?;

    let credential = Credential::new(line.trim());
    if credential.is_some() {
        debug!(source = "prompt", "resolved api credential");
    }
    Ok(credential)
}

fn print_missing_credential_help(output: &mut impl Write) -> Result<()> {
    writeln!(
        output,
        "Warning: {API_KEY_VAR} environment variable not set.\n\
         Please create a .env file in the project root with: {API_KEY_VAR}=your_key_here\n\
         Or set it using: set {API_KEY_VAR}=your_key_here (Windows) \
         or export {API_KEY_VAR}=your_key_here (Linux/Mac)"
    )
    .context("Failed to write credential help")
}
