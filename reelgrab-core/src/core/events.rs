use serde::Serialize;

/// Presentation phase of the analyze/download flow.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Phase {
    Idle,
    Validating,
    Loading,
    Displaying,
    Downloading { format: String },
    Success { file_path: String },
    Error { message: String },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Loading => "loading",
            Phase::Displaying => "displaying",
            Phase::Downloading { .. } => "downloading",
            Phase::Success { .. } => "success",
            Phase::Error { .. } => "error",
        }
    }

    /// Edges of the flow graph. Reset to `Idle` and failure are reachable from
    /// anywhere; a new analysis may start from any settled phase.
    pub fn can_advance_to(&self, next: &Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (_, Idle | Error { .. }) => true,
            (Idle | Displaying | Success { .. } | Error { .. }, Validating) => true,
            (Validating, Loading) => true,
            (Loading, Displaying) => true,
            (Displaying | Success { .. } | Error { .. }, Downloading { .. }) => true,
            (Downloading { .. }, Success { .. }) => true,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DownloadProgress {
    pub platform: String,
    pub format: String,
    pub percent: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
}

pub trait EventEmitter: Send + Sync + Clone + 'static {
    fn emit_phase(&self, phase: &Phase);
    fn emit_progress(&self, progress: &DownloadProgress);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloading() -> Phase {
        Phase::Downloading { format: "hd".into() }
    }

    fn error() -> Phase {
        Phase::Error { message: "x".into() }
    }

    #[test]
    fn happy_path_edges() {
        assert!(Phase::Idle.can_advance_to(&Phase::Validating));
        assert!(Phase::Validating.can_advance_to(&Phase::Loading));
        assert!(Phase::Loading.can_advance_to(&Phase::Displaying));
        assert!(Phase::Displaying.can_advance_to(&downloading()));
        assert!(downloading().can_advance_to(&Phase::Success { file_path: "a".into() }));
    }

    #[test]
    fn failure_edges() {
        assert!(Phase::Validating.can_advance_to(&error()));
        assert!(Phase::Loading.can_advance_to(&error()));
        assert!(downloading().can_advance_to(&error()));
    }

    #[test]
    fn rejected_edges() {
        assert!(!Phase::Idle.can_advance_to(&Phase::Loading));
        assert!(!Phase::Idle.can_advance_to(&downloading()));
        assert!(!Phase::Validating.can_advance_to(&Phase::Displaying));
        assert!(!Phase::Loading.can_advance_to(&downloading()));
    }

    #[test]
    fn reset_and_failure_always_allowed() {
        for p in [Phase::Idle, Phase::Loading, downloading(), error(), Phase::Displaying] {
            assert!(p.can_advance_to(&Phase::Idle));
            assert!(p.can_advance_to(&error()));
        }
    }

    #[test]
    fn success_only_after_download() {
        let done = Phase::Success { file_path: "a".into() };
        assert!(!Phase::Displaying.can_advance_to(&done));
        assert!(!Phase::Loading.can_advance_to(&done));
    }

    #[test]
    fn serializes_tagged() {
        let v = serde_json::to_value(error()).unwrap();
        assert_eq!(v["type"], "Error");
        assert_eq!(v["data"]["message"], "x");
    }
}
