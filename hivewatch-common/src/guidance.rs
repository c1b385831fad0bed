//! Safety guidance rules
//!
//! Fixed do/don't lists derived from where the colony was found and
//! who is reporting it. Shown to the reporter after a positive
//! verification, alongside the regional emergency contact.

use crate::models::{LocationType, UserRole};
use serde::{Deserialize, Serialize};

/// Do/don't lists for one (location, role) combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyGuidance {
    pub dos: Vec<String>,
    pub donts: Vec<String>,
}

/// Build safety guidance for a sighting.
///
/// Location rules come first, then role-specific additions, so the
/// lists read from general hazard handling to personal instructions.
pub fn for_sighting(location: LocationType, role: UserRole) -> SafetyGuidance {
    let mut dos: Vec<String> = Vec::new();
    let mut donts: Vec<String> = Vec::new();

    let push = |list: &mut Vec<String>, items: &[&str]| {
        list.extend(items.iter().map(|s| s.to_string()));
    };

    match location {
        LocationType::Buildings => {
            push(
                &mut dos,
                &[
                    "Keep a safe distance of at least 10 meters",
                    "Alert building residents immediately",
                    "Contact professional bee removal services",
                ],
            );
            push(
                &mut donts,
                &[
                    "Do not attempt to remove the hive yourself",
                    "Do not use water or fire to disperse bees",
                    "Do not block the bees' flight path",
                ],
            );
        }
        LocationType::Farm => {
            push(
                &mut dos,
                &[
                    "Protect nearby crops and livestock",
                    "Consider beekeeping opportunities",
                    "Contact local beekeepers for safe relocation",
                ],
            );
            push(
                &mut donts,
                &[
                    "Do not use pesticides near the hive",
                    "Do not disturb during peak activity hours",
                    "Do not allow children or pets near the area",
                ],
            );
        }
        LocationType::TallCliffsTree | LocationType::Bridges => {
            push(
                &mut dos,
                &[
                    "Mark the area with warning signs",
                    "Contact specialized high-altitude bee removal teams",
                    "Ensure public safety by cordoning off the area",
                ],
            );
            push(
                &mut donts,
                &[
                    "NEVER attempt removal without proper equipment",
                    "Do not climb or approach the hive",
                    "Do not throw objects at the hive",
                ],
            );
        }
        LocationType::Other => {
            push(
                &mut dos,
                &[
                    "Maintain a safe distance",
                    "Call emergency services if threatened",
                    "Document location for authorities",
                ],
            );
            push(
                &mut donts,
                &[
                    "Do not provoke or disturb the bees",
                    "Do not make sudden movements",
                    "Do not use strong perfumes or bright colors nearby",
                ],
            );
        }
    }

    match role {
        UserRole::Farmer => {
            push(
                &mut dos,
                &[
                    "Consider sustainable beekeeping practices",
                    "Consult with apiary experts for hive management",
                ],
            );
        }
        UserRole::GeneralPublic => {
            push(
                &mut dos,
                &[
                    "Report to local authorities immediately",
                    "Warn others in the vicinity",
                ],
            );
        }
        UserRole::AuthorizedPerson => {
            push(
                &mut dos,
                &[
                    "Conduct safety assessment before action",
                    "Wear full protective gear (bee suit, gloves, veil)",
                    "Have emergency medical kit ready",
                ],
            );
        }
        UserRole::Researcher => {
            push(
                &mut dos,
                &[
                    "Follow ethical research protocols",
                    "Obtain necessary permissions before sampling",
                    "Maintain detailed documentation",
                ],
            );
        }
        UserRole::Student => {
            push(
                &mut dos,
                &[
                    "Observe only under supervisor guidance",
                    "Maintain minimum 15-meter observation distance",
                ],
            );
            push(&mut donts, &["Do not approach without instructor permission"]);
        }
    }

    SafetyGuidance { dos, donts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_combination_has_guidance() {
        let locations = [
            LocationType::Buildings,
            LocationType::Farm,
            LocationType::TallCliffsTree,
            LocationType::Bridges,
            LocationType::Other,
        ];
        let roles = [
            UserRole::Farmer,
            UserRole::GeneralPublic,
            UserRole::AuthorizedPerson,
            UserRole::Researcher,
            UserRole::Student,
        ];
        for loc in locations {
            for role in roles {
                let guidance = for_sighting(loc, role);
                assert!(!guidance.dos.is_empty(), "{loc}/{role} has no dos");
                assert!(!guidance.donts.is_empty(), "{loc}/{role} has no donts");
            }
        }
    }

    #[test]
    fn cliffs_and_bridges_share_high_altitude_rules() {
        let cliffs = for_sighting(LocationType::TallCliffsTree, UserRole::GeneralPublic);
        let bridges = for_sighting(LocationType::Bridges, UserRole::GeneralPublic);
        assert_eq!(cliffs, bridges);
        assert!(cliffs
            .donts
            .iter()
            .any(|d| d.contains("without proper equipment")));
    }

    #[test]
    fn student_gets_supervision_rules() {
        let guidance = for_sighting(LocationType::Farm, UserRole::Student);
        assert!(guidance
            .donts
            .iter()
            .any(|d| d.contains("instructor permission")));
    }
}
