//! Snake draft allocation.
//!
//! Turns each participant's ranked athlete preferences into disjoint team
//! rosters.
//!
//! # Algorithm Summary
//!
//! For each gender category independently:
//! 1. Refuse to draft if any participant has no preference list for it
//! 2. For each round, pick in the given order on even rounds and in reverse
//!    on odd rounds
//! 3. On each turn the participant gets the highest-ranked athlete on their
//!    list that nobody has claimed yet; an exhausted list skips the turn
//!
//! The draft is deterministic: the caller supplies the participant order and
//! identical inputs always produce identical rosters. Turns skipped because a
//! list ran out are left empty and reported as [`Shortfall`]s.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Athlete, AthleteId, Gender, ParticipantId};

/// Draft errors. Any of these stops the whole draft before a pick is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// A participant in the pick order has no list for a category.
    #[error("{participant} has not submitted a {gender} preference list")]
    IncompleteSubmission {
        participant: ParticipantId,
        gender: Gender,
    },

    /// The same athlete appears twice in one preference list.
    #[error("{participant} ranked {athlete} more than once in their {gender} list")]
    DuplicatePreference {
        participant: ParticipantId,
        gender: Gender,
        athlete: AthleteId,
    },

    /// A participant appears twice in a pick order.
    #[error("{participant} appears more than once in the {gender} pick order")]
    DuplicateParticipant {
        participant: ParticipantId,
        gender: Gender,
    },

    /// The two categories were given different sets of participants.
    #[error("{participant} is missing from the {gender} pick order")]
    OrderMismatch {
        participant: ParticipantId,
        gender: Gender,
    },

    /// An athlete was ranked in both categories.
    #[error("athlete {athlete} appears in both men's and women's preference lists")]
    CrossCategoryAthlete { athlete: AthleteId },

    /// A preference references an athlete missing from the registry.
    #[error("{participant} ranked unknown athlete {athlete}")]
    UnknownAthlete {
        participant: ParticipantId,
        athlete: AthleteId,
    },

    /// A preference list contains an athlete of the other category.
    #[error("{participant} ranked {athlete} ({actual}) in their {expected} list")]
    WrongCategory {
        participant: ParticipantId,
        athlete: AthleteId,
        expected: Gender,
        actual: Gender,
    },
}

/// Number of athletes each team receives per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterQuota {
    pub men: usize,
    pub women: usize,
}

impl Default for RosterQuota {
    fn default() -> Self {
        Self { men: 3, women: 3 }
    }
}

impl RosterQuota {
    #[must_use]
    pub const fn for_gender(&self, gender: Gender) -> usize {
        match gender {
            Gender::Men => self.men,
            Gender::Women => self.women,
        }
    }
}

/// One participant's ranked athletes, best first. A missing list is not the
/// same as an empty one: only a missing list blocks the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub men: Option<Vec<AthleteId>>,
    #[serde(default)]
    pub women: Option<Vec<AthleteId>>,
}

impl Preferences {
    #[must_use]
    pub fn for_gender(&self, gender: Gender) -> Option<&[AthleteId]> {
        match gender {
            Gender::Men => self.men.as_deref(),
            Gender::Women => self.women.as_deref(),
        }
    }
}

/// Preference lists keyed by participant.
pub type PreferenceBook = BTreeMap<ParticipantId, Preferences>;

/// Pick order for each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub men: Vec<ParticipantId>,
    pub women: Vec<ParticipantId>,
}

impl DraftOrder {
    /// Uses one order for both categories.
    #[must_use]
    pub fn same(order: Vec<ParticipantId>) -> Self {
        Self {
            men: order.clone(),
            women: order,
        }
    }

    #[must_use]
    pub fn for_gender(&self, gender: Gender) -> &[ParticipantId] {
        match gender {
            Gender::Men => &self.men,
            Gender::Women => &self.women,
        }
    }
}

/// Athletes drafted by one participant, in pick order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    #[serde(default)]
    pub men: Vec<AthleteId>,
    #[serde(default)]
    pub women: Vec<AthleteId>,
}

impl TeamRoster {
    #[must_use]
    pub fn for_gender(&self, gender: Gender) -> &[AthleteId] {
        match gender {
            Gender::Men => &self.men,
            Gender::Women => &self.women,
        }
    }

    fn for_gender_mut(&mut self, gender: Gender) -> &mut Vec<AthleteId> {
        match gender {
            Gender::Men => &mut self.men,
            Gender::Women => &mut self.women,
        }
    }

    /// Every athlete on the team, men first.
    pub fn athletes(&self) -> impl Iterator<Item = &AthleteId> {
        self.men.iter().chain(&self.women)
    }
}

/// Team rosters keyed by participant.
pub type Roster = BTreeMap<ParticipantId, TeamRoster>;

/// A single selection made during the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPick {
    pub gender: Gender,
    /// 1-based round number.
    pub round: usize,
    /// 1-based position within the round.
    pub pick: usize,
    /// 1-based position within the category.
    pub overall: usize,
    pub participant: ParticipantId,
    pub athlete: AthleteId,
}

/// A team that ended the draft below quota in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub participant: ParticipantId,
    pub gender: Gender,
    pub filled: usize,
    pub quota: usize,
}

/// Output of a completed draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftResult {
    pub roster: Roster,
    #[serde(default)]
    pub picks: Vec<DraftPick>,
    #[serde(default)]
    pub shortfalls: Vec<Shortfall>,
}

/// Checks every preference against the athlete registry.
pub fn validate_preferences(
    athletes: &[Athlete],
    preferences: &PreferenceBook,
) -> Result<(), DraftError> {
    let genders: HashMap<&AthleteId, Gender> = athletes.iter().map(|a| (&a.id, a.gender)).collect();

    for (participant, prefs) in preferences {
        for expected in Gender::ALL {
            for athlete in prefs.for_gender(expected).unwrap_or_default() {
                match genders.get(athlete) {
                    None => {
                        return Err(DraftError::UnknownAthlete {
                            participant: participant.clone(),
                            athlete: athlete.clone(),
                        });
                    }
                    Some(&actual) if actual != expected => {
                        return Err(DraftError::WrongCategory {
                            participant: participant.clone(),
                            athlete: athlete.clone(),
                            expected,
                            actual,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
    }
    Ok(())
}

/// Run the snake draft for both categories.
///
/// # Arguments
///
/// * `order` - Pick order for round one of each category
/// * `preferences` - Preference lists; participants absent from `order` are ignored
/// * `quota` - Athletes per team per category (the number of rounds)
///
/// # Returns
///
/// Rosters for every participant in the order, the pick log, and any teams
/// left under quota.
pub fn run_draft(
    order: &DraftOrder,
    preferences: &PreferenceBook,
    quota: &RosterQuota,
) -> Result<DraftResult, DraftError> {
    validate_input(order, preferences)?;

    let mut roster: Roster = order
        .men
        .iter()
        .map(|participant| (participant.clone(), TeamRoster::default()))
        .collect();
    let mut picks = Vec::new();

    for gender in Gender::ALL {
        draft_category(
            gender,
            order.for_gender(gender),
            preferences,
            quota.for_gender(gender),
            &mut roster,
            &mut picks,
        );
    }

    let shortfalls = find_shortfalls(&roster, quota);
    for shortfall in &shortfalls {
        tracing::warn!(
            participant = %shortfall.participant,
            gender = %shortfall.gender,
            filled = shortfall.filled,
            quota = shortfall.quota,
            "team drafted below quota"
        );
    }

    tracing::debug!(
        teams = roster.len(),
        picks = picks.len(),
        shortfalls = shortfalls.len(),
        "draft complete"
    );

    Ok(DraftResult {
        roster,
        picks,
        shortfalls,
    })
}

/// Validates orders and lists before any athlete is claimed.
fn validate_input(order: &DraftOrder, preferences: &PreferenceBook) -> Result<(), DraftError> {
    for gender in Gender::ALL {
        let mut seen = HashSet::new();
        for participant in order.for_gender(gender) {
            if !seen.insert(participant) {
                return Err(DraftError::DuplicateParticipant {
                    participant: participant.clone(),
                    gender,
                });
            }
        }
    }

    for (gender, other) in [(Gender::Men, Gender::Women), (Gender::Women, Gender::Men)] {
        let present: HashSet<&ParticipantId> = order.for_gender(gender).iter().collect();
        if let Some(missing) = order
            .for_gender(other)
            .iter()
            .find(|p| !present.contains(p))
        {
            return Err(DraftError::OrderMismatch {
                participant: missing.clone(),
                gender,
            });
        }
    }

    let mut ranked_men = HashSet::new();
    for gender in Gender::ALL {
        for participant in order.for_gender(gender) {
            let list = preferences
                .get(participant)
                .and_then(|prefs| prefs.for_gender(gender))
                .ok_or_else(|| DraftError::IncompleteSubmission {
                    participant: participant.clone(),
                    gender,
                })?;

            let mut seen = HashSet::new();
            for athlete in list {
                if !seen.insert(athlete) {
                    return Err(DraftError::DuplicatePreference {
                        participant: participant.clone(),
                        gender,
                        athlete: athlete.clone(),
                    });
                }
                match gender {
                    Gender::Men => {
                        ranked_men.insert(athlete);
                    }
                    Gender::Women if ranked_men.contains(athlete) => {
                        return Err(DraftError::CrossCategoryAthlete {
                            athlete: athlete.clone(),
                        });
                    }
                    Gender::Women => {}
                }
            }
        }
    }

    Ok(())
}

/// Snake-drafts one category into `roster`.
fn draft_category(
    gender: Gender,
    order: &[ParticipantId],
    preferences: &PreferenceBook,
    rounds: usize,
    roster: &mut Roster,
    picks: &mut Vec<DraftPick>,
) {
    let mut claimed: HashSet<&AthleteId> = HashSet::new();
    let mut overall = 0;

    for round in 0..rounds {
        let round_order: Vec<&ParticipantId> = if round % 2 == 0 {
            order.iter().collect()
        } else {
            order.iter().rev().collect()
        };

        for (pick_idx, participant) in round_order.into_iter().enumerate() {
            let list = preferences
                .get(participant)
                .and_then(|prefs| prefs.for_gender(gender))
                .unwrap_or_default();

            let Some(athlete) = list.iter().find(|a| !claimed.contains(a)) else {
                tracing::debug!(
                    %participant,
                    %gender,
                    round = round + 1,
                    "preference list exhausted; turn skipped"
                );
                continue;
            };

            claimed.insert(athlete);
            overall += 1;
            roster
                .entry(participant.clone())
                .or_default()
                .for_gender_mut(gender)
                .push(athlete.clone());
            picks.push(DraftPick {
                gender,
                round: round + 1,
                pick: pick_idx + 1,
                overall,
                participant: participant.clone(),
                athlete: athlete.clone(),
            });
        }
    }
}

fn find_shortfalls(roster: &Roster, quota: &RosterQuota) -> Vec<Shortfall> {
    let mut shortfalls = Vec::new();
    for gender in Gender::ALL {
        let required = quota.for_gender(gender);
        for (participant, team) in roster {
            let filled = team.for_gender(gender).len();
            if filled < required {
                shortfalls.push(Shortfall {
                    participant: participant.clone(),
                    gender,
                    filled,
                    quota: required,
                });
            }
        }
    }
    shortfalls
}
