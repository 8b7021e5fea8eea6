//! Step planning for install and update calls.

use crate::config::UpdateStrategy;

/// Which public operation is being planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Ensure present; an existing directory is used as-is.
    Load,
    /// Bring an existing install up to date using the configured strategy.
    Refresh,
    /// Always delete and clone again.
    InstallLatest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Remove,
    Clone,
    Pull,
    InstallDependencies,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Nothing to do; the package directory is already there.
    ShortCircuit,
    /// Run these steps in order.
    Run(Vec<Step>),
}

impl Plan {
    pub fn steps(&self) -> &[Step] {
        match self {
            Plan::ShortCircuit => &[],
            Plan::Run(steps) => steps,
        }
    }
}

pub fn plan(mode: Mode, present: bool, strategy: UpdateStrategy) -> Plan {
    if !present {
        return Plan::Run(vec![Step::Clone, Step::InstallDependencies]);
    }
    match (mode, strategy) {
        (Mode::Load, _) => Plan::ShortCircuit,
        (Mode::Refresh, UpdateStrategy::Rebase) => {
            Plan::Run(vec![Step::Pull, Step::InstallDependencies])
        }
        (Mode::Refresh, UpdateStrategy::Reclone) | (Mode::InstallLatest, _) => {
            Plan::Run(vec![Step::Remove, Step::Clone, Step::InstallDependencies])
        }
    }
}
