use serde::{Deserialize, Serialize};

use super::Address;
use crate::error::{MirrorError, Result};

/// Opaque decoded account contents, served verbatim by the query API
pub type Payload = serde_json::Value;

/// Payload field carrying a game's round history address
pub const ROUND_HISTORY_FIELD: &str = "roundHistory";
/// Payload field carrying a game's user prediction history address
pub const USER_PREDICTION_HISTORY_FIELD: &str = "userPredictionHistory";

/// Top-level record categories discovered by enumerating the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vault,
    Round,
    Game,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Vault, Category::Round, Category::Game];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vault => "vault",
            Category::Round => "round",
            Category::Game => "game",
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            Category::Vault => AccountKind::Vault,
            Category::Round => AccountKind::Round,
            Category::Game => AccountKind::Game,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Every account kind the fetcher can hold a subscription for. The two history
/// kinds are dependents of a game and never enumerated directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountKind {
    Vault,
    Round,
    Game,
    RoundHistory,
    UserPredictionHistory,
}

impl AccountKind {
    /// Account struct name in the program IDL
    pub fn account_name(&self) -> &'static str {
        match self {
            AccountKind::Vault => "Vault",
            AccountKind::Round => "Round",
            AccountKind::Game => "Game",
            AccountKind::RoundHistory => "RoundHistory",
            AccountKind::UserPredictionHistory => "UserPredictionHistory",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Vault => "vault",
            AccountKind::Round => "round",
            AccountKind::Game => "game",
            AccountKind::RoundHistory => "roundHistory",
            AccountKind::UserPredictionHistory => "userPredictionHistory",
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            AccountKind::Vault => Some(Category::Vault),
            AccountKind::Round => Some(Category::Round),
            AccountKind::Game => Some(Category::Game),
            AccountKind::RoundHistory | AccountKind::UserPredictionHistory => None,
        }
    }
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A plain record whose payload the mirror never looks inside
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub address: Address,
    pub payload: Payload,
}

/// A game record with its two dependent history accounts
#[derive(Debug, Clone, PartialEq)]
pub struct GameAccount {
    pub address: Address,
    pub round_history: Address,
    pub user_prediction_history: Address,
    pub payload: Payload,
}

impl GameAccount {
    pub fn from_payload(address: Address, payload: Payload) -> Result<Self> {
        let round_history = payload_address(&payload, ROUND_HISTORY_FIELD)?;
        let user_prediction_history = payload_address(&payload, USER_PREDICTION_HISTORY_FIELD)?;
        Ok(Self {
            address,
            round_history,
            user_prediction_history,
            payload,
        })
    }

    /// Dependent accounts in subscription order
    pub fn dependents(&self) -> [(AccountKind, Address); 2] {
        [
            (AccountKind::UserPredictionHistory, self.user_prediction_history),
            (AccountKind::RoundHistory, self.round_history),
        ]
    }
}

/// Typed view of a discovered record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Vault(Account),
    Round(Account),
    Game(GameAccount),
}

impl Record {
    /// Rebuild the typed view from a payload produced by the decoder.
    pub fn from_payload(category: Category, address: Address, payload: Payload) -> Result<Self> {
        match category {
            Category::Vault => Ok(Record::Vault(Account { address, payload })),
            Category::Round => Ok(Record::Round(Account { address, payload })),
            Category::Game => GameAccount::from_payload(address, payload).map(Record::Game),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Record::Vault(_) => Category::Vault,
            Record::Round(_) => Category::Round,
            Record::Game(_) => Category::Game,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Record::Vault(a) | Record::Round(a) => a.address,
            Record::Game(g) => g.address,
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Record::Vault(a) | Record::Round(a) => &a.payload,
            Record::Game(g) => &g.payload,
        }
    }

    pub fn into_payload(self) -> Payload {
        match self {
            Record::Vault(a) | Record::Round(a) => a.payload,
            Record::Game(g) => g.payload,
        }
    }
}

fn payload_address(payload: &Payload, field: &str) -> Result<Address> {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| MirrorError::Decode(format!("game payload missing `{field}`")))?
        .parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_game_from_payload_exposes_dependents() {
        let rh = Address::new([2u8; 32]);
        let uph = Address::new([3u8; 32]);
        let payload = json!({
            ROUND_HISTORY_FIELD: rh.to_string(),
            USER_PREDICTION_HISTORY_FIELD: uph.to_string(),
        });
        let record = Record::from_payload(Category::Game, Address::new([1u8; 32]), payload).unwrap();
        let Record::Game(game) = record else {
            panic!("expected a game record");
        };
        assert_eq!(game.round_history, rh);
        assert_eq!(game.user_prediction_history, uph);
        assert_eq!(
            game.dependents(),
            [
                (AccountKind::UserPredictionHistory, uph),
                (AccountKind::RoundHistory, rh)
            ]
        );
    }

    #[test]
    fn test_game_payload_without_refs_is_rejected() {
        let err = Record::from_payload(Category::Game, Address::new([1u8; 32]), json!({}))
            .unwrap_err();
        assert!(matches!(err, MirrorError::Decode(_)));
    }

    #[test]
    fn test_vault_payload_is_opaque() {
        let record =
            Record::from_payload(Category::Vault, Address::new([1u8; 32]), json!({"x": 1})).unwrap();
        assert_eq!(record.category(), Category::Vault);
        assert_eq!(record.payload(), &json!({"x": 1}));
    }

    #[test]
    fn test_kind_category_mapping() {
        for category in Category::ALL {
            assert_eq!(category.kind().category(), Some(category));
        }
        assert_eq!(AccountKind::RoundHistory.category(), None);
    }
}
