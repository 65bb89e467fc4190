//! Battle log types.
//!
//! A battle log is the ordered, replayable record of one simulation. Renderers
//! replay it step by step and match on [`StepType`], so the serialized step
//! vocabulary (`attack`, `critical`, `skill`, `dodge`, `block`, `special`,
//! `levelup`, `end`) is a compatibility contract.

use crate::fighter::FighterId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a logged step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Attack,
    Critical,
    Skill,
    Dodge,
    Block,
    Special,
    LevelUp,
    End,
}

impl StepType {
    pub fn name(&self) -> &'static str {
        match self {
            StepType::Attack => "attack",
            StepType::Critical => "critical",
            StepType::Skill => "skill",
            StepType::Dodge => "dodge",
            StepType::Block => "block",
            StepType::Special => "special",
            StepType::LevelUp => "levelup",
            StepType::End => "end",
        }
    }

    /// Steps produced by a combat action, as opposed to summary steps.
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            StepType::Attack
                | StepType::Critical
                | StepType::Skill
                | StepType::Dodge
                | StepType::Block
        )
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Remaining HP of both combatants after a step.
///
/// `fighter_a` is [`BattleLog::participants`]`[0]` and `fighter_b` is
/// `participants[1]`, whichever of them attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HpSnapshot {
    pub fighter_a: u32,
    pub fighter_b: u32,
}

/// One discrete combat event.
///
/// For the `end` step `attacker` is the winner and `defender` the loser. For
/// summary steps `attacker` is the fighter the summary is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub attacker: FighterId,
    pub defender: FighterId,
    pub damage: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<HpSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<String>,
}

/// A combatant as it entered the fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: FighterId,
    pub name: String,
    pub level: u32,
    pub max_hp: u32,
    pub starting_hp: u32,
}

/// Experience earned by one fighter, with the level-up preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub fighter: FighterId,
    pub xp: u32,
    pub levels_gained: u32,
}

impl Reward {
    pub fn levels_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Why the fight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndReason {
    /// The loser's HP reached zero.
    Knockout,
    /// Turn cap reached; the winner had strictly more HP.
    HpLead,
    /// Turn cap reached with equal HP; a seeded coin flip decided.
    CoinFlip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleOutcome {
    pub winner: FighterId,
    pub loser: FighterId,
    pub reason: EndReason,
    /// Number of combat actions taken.
    pub turns: u32,
    pub winner_reward: Reward,
    pub loser_reward: Reward,
}

/// Complete record of one simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleLog {
    pub participants: [Participant; 2],
    pub steps: Vec<FightStep>,
    pub outcome: BattleOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl BattleLog {
    pub fn participant(&self, id: FighterId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn last_step(&self) -> Option<&FightStep> {
        self.steps.last()
    }

    /// Steps produced by combat actions.
    pub fn actions(&self) -> impl Iterator<Item = &FightStep> {
        self.steps.iter().filter(|s| s.step_type.is_action())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_type_vocabulary() {
        let names: Vec<String> = [
            StepType::Attack,
            StepType::Critical,
            StepType::Skill,
            StepType::Dodge,
            StepType::Block,
            StepType::Special,
            StepType::LevelUp,
            StepType::End,
        ]
        .iter()
        .map(|t| serde_json::to_value(t).unwrap().as_str().unwrap().to_string())
        .collect();
        assert_eq!(
            names,
            vec!["attack", "critical", "skill", "dodge", "block", "special", "levelup", "end"]
        );
    }

    #[test]
    fn test_step_serializes_flat() {
        let step = FightStep {
            step_type: StepType::Critical,
            attacker: FighterId::new(),
            defender: FighterId::new(),
            damage: 12,
            skill: None,
            description: "crit".to_string(),
            hp: Some(HpSnapshot {
                fighter_a: 40,
                fighter_b: 28,
            }),
            special_effect: None,
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["type"], "critical");
        assert_eq!(value["damage"], 12);
        assert_eq!(value["hp"]["fighterB"], 28);
        assert!(value.get("skill").is_none());
        assert!(value.get("specialEffect").is_none());
    }
}
