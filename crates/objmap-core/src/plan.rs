//! Resolved mapping plans

use serde::{Deserialize, Serialize};

/// How a destination property got its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanOrigin {
    /// Configured with `for_member`
    Explicit,
    /// Discovered by naming convention
    Convention { confidence: f64 },
    /// Source key with the same name
    Direct,
}

/// One destination property of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMember {
    pub destination: String,
    /// Source key or dot path; `None` for explicit members without `map_from`
    pub source: Option<String>,
    pub origin: PlanOrigin,
}

/// Destination property plan for one type pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlan {
    pub source_type: String,
    pub destination_type: String,
    /// Hash of the configuration the plan was built from
    pub fingerprint: u64,
    /// Destination accepts every source key (generic-map destination)
    pub open_destination: bool,
    pub members: Vec<PlanMember>,
}

impl ResolvedPlan {
    #[must_use]
    pub fn member(&self, destination: &str) -> Option<&PlanMember> {
        self.members.iter().find(|m| m.destination == destination)
    }

    /// Members found by convention discovery, as (destination, source)
    #[must_use]
    pub fn discovered(&self) -> Vec<(&str, &str)> {
        self.members
            .iter()
            .filter(|m| matches!(m.origin, PlanOrigin::Convention { .. }))
            .filter_map(|m| m.source.as_deref().map(|s| (m.destination.as_str(), s)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_serializes_with_tagged_origins() {
        let plan = ResolvedPlan {
            source_type: "UserRecord".into(),
            destination_type: "UserDto".into(),
            fingerprint: 7,
            open_destination: false,
            members: vec![
                PlanMember {
                    destination: "userId".into(),
                    source: Some("user_id".into()),
                    origin: PlanOrigin::Convention { confidence: 0.85 },
                },
                PlanMember {
                    destination: "email".into(),
                    source: Some("email".into()),
                    origin: PlanOrigin::Direct,
                },
            ],
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["members"][0]["origin"]["kind"], "convention");
        assert_eq!(plan.discovered(), vec![("userId", "user_id")]);
        assert_eq!(plan.member("email").unwrap().origin, PlanOrigin::Direct);

        let back: ResolvedPlan = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }
}
