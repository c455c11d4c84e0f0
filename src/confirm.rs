// Operator confirmation checkpoints.
use dialoguer::Confirm;

/// Asks the operator whether to continue. Injected into the aggregation and
/// batch flow so the logic stays testable without a real terminal.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive y/n prompt on the controlling terminal.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        Confirm::new()
            .with_prompt(prompt)
            .interact()
            .unwrap_or(false)
    }
}

/// Always continues.
pub struct AlwaysYes;

impl Confirmer for AlwaysYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Always declines.
pub struct AlwaysNo;

impl Confirmer for AlwaysNo {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}
