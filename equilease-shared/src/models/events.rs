use uuid::Uuid;

/// Outcome of a single creation inside a bulk generation run.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemOutcome {
    Created,
    Failed,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct VariantProgressEvent {
    pub run_id: Uuid,
    pub product_id: Uuid,
    /// Position of the combination in the run, starting at 0
    pub index: usize,
    pub total: usize,
    pub outcome: ItemOutcome,
    pub combination: serde_json::Value,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct VariantsGeneratedEvent {
    pub run_id: Uuid,
    pub product_id: Uuid,
    pub considered: usize,
    pub skipped: usize,
    pub created: usize,
    pub failed: usize,
    pub timestamp: i64,
}

/// Everything published on the generation channel.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    Progress(VariantProgressEvent),
    Completed(VariantsGeneratedEvent),
}

impl GenerationEvent {
    pub fn product_id(&self) -> Uuid {
        match self {
            GenerationEvent::Progress(e) => e.product_id,
            GenerationEvent::Completed(e) => e.product_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GenerationEvent::Progress(_) => "progress",
            GenerationEvent::Completed(_) => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged_by_type() {
        let event = GenerationEvent::Completed(VariantsGeneratedEvent {
            run_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            considered: 4,
            skipped: 1,
            created: 2,
            failed: 1,
            timestamp: 0,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "completed");
        assert_eq!(json["created"], 2);
        assert_eq!(event.name(), "completed");
    }
}
