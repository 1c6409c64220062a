use std::io::{self, Write};

use crate::config::API_KEY_VAR;
use crate::error::ChatError;

const BILLING_URL: &str = "https://platform.openai.com/account/billing";
const API_KEYS_URL: &str = "https://platform.openai.com/account/api-keys";

/// Prints the raw error followed by operator guidance for its kind.
pub fn write_failure_report(output: &mut impl Write, err: &ChatError) -> io::Result<()> {
    match err {
        ChatError::QuotaExceeded { .. } => {
            writeln!(output, "\n❌ Rate Limit Error: {err}")?;
            writeln!(output, "\nPossible solutions:")?;
            writeln!(output, "1. Check your OpenAI account at {BILLING_URL}")?;
            writeln!(output, "2. Verify you have available credits/quota")?;
            writeln!(output, "3. Ensure your API key matches the account with credits")?;
            writeln!(output, "4. Add a payment method if required (even for free credits)")?;
            writeln!(output, "5. Wait a few minutes if you just added credits\n")
        }
        ChatError::RemoteService {
            invalid_credential: true,
            ..
        } => {
            writeln!(output, "\n❌ API Error: {err}")?;
            writeln!(output, "\n⚠ Invalid API Key Detected!")?;
            writeln!(output, "The API key in your .env file is incorrect or expired.")?;
            writeln!(output, "Please:")?;
            writeln!(output, "1. Get a new API key from: {API_KEYS_URL}")?;
            writeln!(
                output,
                "2. Update your .env file with: {API_KEY_VAR}=your_new_key_here"
            )?;
            writeln!(output, "3. Make sure there are no spaces or quotes around the key\n")
        }
        ChatError::RemoteService { .. } => {
            writeln!(output, "\n❌ API Error: {err}")?;
            writeln!(output, "Please check your API key and account status.\n")
        }
        ChatError::Unclassified { .. } => writeln!(output, "\n❌ Unexpected error: {err}\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::write_failure_report;
    use crate::error::ChatError;

    fn report(err: &ChatError) -> String {
        let mut output = Vec::new();
        write_failure_report(&mut output, err).expect("in-memory write should succeed");
        String::from_utf8(output).expect("report is utf-8")
    }

    fn numbered_steps(report: &str) -> Vec<&str> {
        report
            .lines()
            .filter(|line| {
                line.split_once(". ")
                    .is_some_and(|(prefix, _)| prefix.parse::<u8>().is_ok())
            })
            .collect()
    }

    #[test]
    fn quota_report_lists_five_steps() {
        let out = report(&ChatError::QuotaExceeded {
            message: "Error code: 429 - quota".to_string(),
        });
        assert!(out.contains("Rate Limit Error: Error code: 429 - quota"));
        assert_eq!(numbered_steps(&out).len(), 5, "unexpected report:\n{out}");
        assert!(out.contains("billing"));
    }

    #[test]
    fn invalid_credential_report_lists_three_steps() {
        let out = report(&ChatError::RemoteService {
            status: Some(401),
            message: "Incorrect API key provided".to_string(),
            invalid_credential: true,
        });
        assert!(out.contains("API Error: Incorrect API key provided"));
        assert!(out.contains("Invalid API Key Detected"));
        assert_eq!(numbered_steps(&out).len(), 3, "unexpected report:\n{out}");
        assert!(out.contains("OPENAI_API_KEY=your_new_key_here"));
    }

    #[test]
    fn generic_remote_report_points_at_account_status() {
        let out = report(&ChatError::RemoteService {
            status: Some(500),
            message: "server error".to_string(),
            invalid_credential: false,
        });
        assert!(out.contains("API Error: server error"));
        assert!(out.contains("Please check your API key and account status."));
        assert!(!out.contains("Invalid API Key Detected"));
        assert!(numbered_steps(&out).is_empty());
    }

    #[test]
    fn unclassified_report_uses_unexpected_label() {
        let out = report(&ChatError::unclassified("connection reset"));
        assert!(out.contains("Unexpected error: connection reset"));
        assert!(!out.contains("API Error"));
    }
}
