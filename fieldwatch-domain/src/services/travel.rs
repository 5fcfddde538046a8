// Travel-time feasibility between consecutive activities of one technician

use crate::entities::{Activity, ClientDirectory, TravelPolicy};
use crate::services::geo::{haversine_km, zone_distance_km};
use crate::value_objects::Confidence;

pub const DEFAULT_TRAVEL_MIN_CONFIDENCE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptionReason {
    InternalWhitelist,
    SameClient,
    SameGroup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TravelAssessment {
    Exempt(ExemptionReason),
    Sufficient {
        travel_minutes: f64,
        required_minutes: f64,
        distance_km: f64,
    },
    Insufficient {
        travel_minutes: f64,
        required_minutes: f64,
        distance_km: f64,
        confidence: Confidence,
    },
}

impl TravelAssessment {
    pub fn confidence(&self) -> Confidence {
        match self {
            TravelAssessment::Insufficient { confidence, .. } => *confidence,
            _ => Confidence::new(0.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TravelFinding<'a> {
    pub previous: &'a Activity,
    pub next: &'a Activity,
    pub travel_minutes: f64,
    pub required_minutes: f64,
    pub distance_km: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
pub struct TravelTimeValidator {
    policy: TravelPolicy,
    directory: ClientDirectory,
    min_confidence: f64,
}

impl TravelTimeValidator {
    pub fn new(policy: TravelPolicy, directory: ClientDirectory, min_confidence: f64) -> Self {
        Self {
            policy,
            directory,
            min_confidence,
        }
    }

    pub fn policy(&self) -> &TravelPolicy {
        &self.policy
    }

    /// Consecutive-pair scan over timed activities sorted by start.
    pub fn scan<'a>(&self, activities: &[&'a Activity]) -> Vec<TravelFinding<'a>> {
        let mut timed: Vec<&'a Activity> = activities
            .iter()
            .copied()
            .filter(|activity| activity.is_timed())
            .collect();
        timed.sort_by_key(|activity| activity.started_at);

        timed
            .windows(2)
            .filter_map(|pair| {
                let (previous, next) = (pair[0], pair[1]);
                match self.assess(previous, next)? {
                    TravelAssessment::Insufficient {
                        travel_minutes,
                        required_minutes,
                        distance_km,
                        confidence,
                    } if confidence.meets(self.min_confidence) => Some(TravelFinding {
                        previous,
                        next,
                        travel_minutes,
                        required_minutes,
                        distance_km,
                        confidence,
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    /// A negative gap (the next activity starts before the previous one ends) is scored like any other shortfall.
    pub fn assess(&self, previous: &Activity, next: &Activity) -> Option<TravelAssessment> {
        let travel_minutes = previous.minutes_until(next)?;
        if let Some(reason) = self.exemption(previous.client_name(), next.client_name()) {
            return Some(TravelAssessment::Exempt(reason));
        }

        let distance_km = self.estimate_distance(previous.client_name(), next.client_name());
        let required_minutes = self.required_minutes(distance_km);
        if travel_minutes < required_minutes {
            Some(TravelAssessment::Insufficient {
                travel_minutes,
                required_minutes,
                distance_km,
                confidence: travel_confidence(travel_minutes, required_minutes, distance_km),
            })
        } else {
            Some(TravelAssessment::Sufficient {
                travel_minutes,
                required_minutes,
                distance_km,
            })
        }
    }

    pub fn exemption(&self, from: &str, to: &str) -> Option<ExemptionReason> {
        if self.policy.is_whitelisted(from) || self.policy.is_whitelisted(to) {
            return Some(ExemptionReason::InternalWhitelist);
        }
        if from.trim() == to.trim() {
            return Some(ExemptionReason::SameClient);
        }
        if self.policy.same_group(from, to) {
            return Some(ExemptionReason::SameGroup);
        }
        match (self.directory.find(from), self.directory.find(to)) {
            (Some(a), Some(b)) if a.is_same_group_as(b) => Some(ExemptionReason::SameGroup),
            _ => None,
        }
    }

    pub fn estimate_distance(&self, from: &str, to: &str) -> f64 {
        match (self.directory.find(from), self.directory.find(to)) {
            (Some(a), Some(b)) => match (a.coordinates(), b.coordinates()) {
                (Some(x), Some(y)) => haversine_km(x, y),
                _ => zone_distance_km(a.effective_zone(), b.effective_zone()),
            },
            _ => self.policy.default_distance_km,
        }
    }

    pub fn required_minutes(&self, distance_km: f64) -> f64 {
        let floor = self.policy.min_travel_minutes as f64;
        if self.policy.average_speed_kmh <= 0.0 {
            return floor;
        }
        (distance_km / self.policy.average_speed_kmh * 60.0).max(floor)
    }
}

pub fn travel_confidence(travel_minutes: f64, required_minutes: f64, distance_km: f64) -> Confidence {
    if required_minutes <= 0.0 || travel_minutes >= required_minutes {
        return Confidence::new(0.0);
    }
    let mut score = ((1.0 - travel_minutes / required_minutes) * 70.0).clamp(0.0, 70.0);
    if distance_km > 15.0 {
        score += 20.0;
    } else if distance_km > 8.0 {
        score += 10.0;
    }
    if travel_minutes == 0.0 {
        score *= 0.7;
    } else if travel_minutes < 5.0 {
        score *= 0.8;
    }
    Confidence::new(score.min(85.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::activity::fixtures::{activity, at};
    use crate::entities::Client;

    fn directory() -> ClientDirectory {
        let mut a = Client::named("Cliente A");
        a.latitude = Some(45.46);
        a.longitude = Some(9.19);
        let mut c = Client::named("Cliente C");
        c.latitude = Some(45.46 + 0.17987);
        c.longitude = Some(9.19);
        ClientDirectory::new(vec![a, c])
    }

    fn validator() -> TravelTimeValidator {
        TravelTimeValidator::new(
            TravelPolicy::default(),
            directory(),
            DEFAULT_TRAVEL_MIN_CONFIDENCE,
        )
    }

    #[test]
    fn short_hop_to_distant_client_is_flagged() {
        let a = activity("1", "Matteo Signo", "Cliente A", at(4, 10, 0), at(4, 12, 0));
        let c = activity("2", "Matteo Signo", "Cliente C", at(4, 12, 10), at(4, 14, 0));
        let findings = validator().scan(&[&a, &c]);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert!((finding.distance_km - 20.0).abs() < 0.05);
        assert!((finding.required_minutes - 60.0).abs() < 0.2);
        assert_eq!(finding.travel_minutes, 10.0);
        assert!((finding.confidence.score() - 78.33).abs() < 0.1);
    }

    #[test]
    fn whitelist_short_circuits() {
        let validator = validator();
        let a = activity("1", "Matteo Signo", "BAIT Service S.r.l.", at(4, 10, 0), at(4, 12, 0));
        let c = activity("2", "Matteo Signo", "Cliente C", at(4, 12, 0), at(4, 14, 0));
        let assessment = validator.assess(&a, &c).expect("timed pair");
        assert_eq!(
            assessment,
            TravelAssessment::Exempt(ExemptionReason::InternalWhitelist)
        );
        assert_eq!(assessment.confidence().score(), 0.0);
    }

    #[test]
    fn same_client_and_group_are_exempt() {
        let validator = validator();
        assert_eq!(
            validator.exemption(" Cliente A", "Cliente A "),
            Some(ExemptionReason::SameClient)
        );
        assert_eq!(
            validator.exemption("ISOTERMA SRL", "GARIBALDINA SRL"),
            Some(ExemptionReason::SameGroup)
        );
        assert_eq!(validator.exemption("Cliente A", "Cliente C"), None);
    }

    #[test]
    fn required_minutes_never_below_floor() {
        let validator = validator();
        for distance in [0.0, 1.0, 4.9, 5.0] {
            assert_eq!(validator.required_minutes(distance), 15.0);
        }
        assert_eq!(validator.required_minutes(20.0), 60.0);
    }

    #[test]
    fn unknown_clients_use_default_distance() {
        let validator = validator();
        assert_eq!(validator.estimate_distance("Nowhere", "Cliente A"), 12.0);
    }

    #[test]
    fn zone_fallback_without_coordinates() {
        let mut periphery = Client::named("Periferia SRL");
        periphery.zone = Some(crate::value_objects::ClientZone::Periphery);
        let central = Client::named("Centro SPA");
        let validator = TravelTimeValidator::new(
            TravelPolicy::default(),
            ClientDirectory::new(vec![periphery, central]),
            DEFAULT_TRAVEL_MIN_CONFIDENCE,
        );
        assert_eq!(validator.estimate_distance("Periferia SRL", "Centro SPA"), 15.0);
    }

    #[test]
    fn confidence_is_zero_when_time_suffices() {
        assert_eq!(travel_confidence(60.0, 60.0, 20.0).score(), 0.0);
        assert!((travel_confidence(0.0, 60.0, 30.0).score() - 63.0).abs() < 1e-9);
        assert!(travel_confidence(1.0, 15.0, 40.0).score() <= 85.0);
        // Half a minute is not a zero gap: 70 * (1 - 0.5 / 60) + 20, then the short-gap factor.
        let half_minute = travel_confidence(0.5, 60.0, 20.0).score();
        assert!((half_minute - (70.0 * (1.0 - 0.5 / 60.0) + 20.0) * 0.8).abs() < 1e-9);
    }

    #[test]
    fn negative_gap_raises_travel_alert() {
        // -10 minutes against 60 required: 70 (clamped) + 20 for distance, times 0.8.
        let a = activity("1", "Matteo Signo", "Cliente A", at(4, 10, 0), at(4, 12, 0));
        let c = activity("2", "Matteo Signo", "Cliente C", at(4, 11, 50), at(4, 14, 0));
        let findings = validator().scan(&[&a, &c]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].travel_minutes, -10.0);
        assert!((findings[0].confidence.score() - 72.0).abs() < 1e-9);
    }
}
