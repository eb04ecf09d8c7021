use metrics::{describe_gauge, gauge};

pub fn component_info_metric(name: &'static str) {
    static NAME: &str = "specter_component_info";

    describe_gauge!(NAME, "Basic information about the component");

    let git_rev = option_env!("GIT_VERSION").unwrap_or("unknown");
    gauge!(NAME, "component" => name, "git_version" => git_rev).set(1);
}

pub mod names {
    pub const EVENTS_PROCESSED: &str = "specter_events_processed";
    pub const FAILURES: &str = "specter_failures";
    pub const HITS_RECEIVED: &str = "specter_hits_received";
    pub const HITS_UNMAPPED: &str = "specter_hits_unmapped";
}

pub mod failures {
    #[derive(Debug, Clone, Eq, Hash, PartialEq)]
    pub enum FailureKind {
        InvalidKinematics,
        UnableToDecodeEvent,
    }

    // Label building function
    pub fn get_label(failure_kind: FailureKind) -> (&'static str, &'static str) {
        (
            "failure_kind",
            match failure_kind {
                FailureKind::InvalidKinematics => "invalid_kinematics",
                FailureKind::UnableToDecodeEvent => "unable_to_decode_event",
            },
        )
    }
}
