//! Typed relation events and their weighting policies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of node a relation endpoint refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Account,
    Content,
    Organization,
}

impl NodeType {
    pub const ALL: [NodeType; 3] = [NodeType::Account, NodeType::Content, NodeType::Organization];

    pub fn name(&self) -> &'static str {
        match self {
            NodeType::Account => "ACCOUNT",
            NodeType::Content => "CONTENT",
            NodeType::Organization => "ORGANIZATION",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown node type '{}'", s))
    }
}

/// How a relation kind contributes to the weight matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationPolicy {
    /// Added onto the (target, source) cell
    pub weight: i64,
    /// Added onto the (source, target) cell
    pub reverse_weight: i64,
    pub decayable: bool,
    pub source_type: NodeType,
    pub target_type: NodeType,
}

/// A relation kind the engine has no built-in knowledge of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRelation {
    pub name: String,
    pub policy: RelationPolicy,
}

/// Closed set of relation kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Transfer {
        amount: u64,
        source_balance: u64,
        target_balance: u64,
    },
    Upvote,
    Downvote,
    Trust,
    Follow,
    Ownership,
    Repost,
    Membership,
    Comment,
    Custom(CustomRelation),
}

impl RelationKind {
    pub const TRANSFER: &'static str = "TRANSFER";
    pub const UPVOTE: &'static str = "UPVOTE";
    pub const DOWNVOTE: &'static str = "DOWNVOTE";
    pub const TRUST: &'static str = "TRUST";
    pub const FOLLOW: &'static str = "FOLLOW";
    pub const OWNERSHIP: &'static str = "OWNERSHIP";
    pub const REPOST: &'static str = "REPOST";
    pub const MEMBERSHIP: &'static str = "MEMBERSHIP";
    pub const COMMENT: &'static str = "COMMENT";

    pub fn name(&self) -> &str {
        match self {
            RelationKind::Transfer { .. } => Self::TRANSFER,
            RelationKind::Upvote => Self::UPVOTE,
            RelationKind::Downvote => Self::DOWNVOTE,
            RelationKind::Trust => Self::TRUST,
            RelationKind::Follow => Self::FOLLOW,
            RelationKind::Ownership => Self::OWNERSHIP,
            RelationKind::Repost => Self::REPOST,
            RelationKind::Membership => Self::MEMBERSHIP,
            RelationKind::Comment => Self::COMMENT,
            RelationKind::Custom(custom) => &custom.name,
        }
    }

    pub fn policy(&self) -> RelationPolicy {
        use NodeType::*;

        let fixed = |weight, reverse_weight, decayable, source_type, target_type| RelationPolicy {
            weight,
            reverse_weight,
            decayable,
            source_type,
            target_type,
        };

        match self {
            RelationKind::Transfer { amount, .. } => {
                let amount = i64::try_from(*amount).unwrap_or(i64::MAX);
                fixed(amount, -amount, true, Account, Account)
            }
            RelationKind::Upvote => fixed(1, 0, true, Account, Content),
            RelationKind::Downvote => fixed(-1, 0, true, Account, Content),
            RelationKind::Trust => fixed(10, 0, true, Account, Account),
            RelationKind::Follow => fixed(2, 0, false, Account, Account),
            RelationKind::Ownership => fixed(1, 1, false, Account, Content),
            RelationKind::Repost => fixed(1, 0, true, Content, Content),
            RelationKind::Membership => fixed(10, 10, true, Account, Organization),
            RelationKind::Comment => fixed(1, 0, true, Content, Content),
            RelationKind::Custom(custom) => custom.policy,
        }
    }

    /// Rebuild a kind from its name and raw fields.
    ///
    /// Built-in names ignore the raw policy, except TRANSFER which reads its
    /// amount from `policy.weight`. Any other name becomes a custom kind.
    pub fn from_parts(name: &str, policy: RelationPolicy, balances: (u64, u64)) -> Self {
        match name {
            Self::TRANSFER => RelationKind::Transfer {
                amount: policy.weight.max(0) as u64,
                source_balance: balances.0,
                target_balance: balances.1,
            },
            Self::UPVOTE => RelationKind::Upvote,
            Self::DOWNVOTE => RelationKind::Downvote,
            Self::TRUST => RelationKind::Trust,
            Self::FOLLOW => RelationKind::Follow,
            Self::OWNERSHIP => RelationKind::Ownership,
            Self::REPOST => RelationKind::Repost,
            Self::MEMBERSHIP => RelationKind::Membership,
            Self::COMMENT => RelationKind::Comment,
            _ => RelationKind::Custom(CustomRelation {
                name: name.to_string(),
                policy,
            }),
        }
    }
}

/// A typed, directed, weighted edge event between two external ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    /// Block height the relation was observed at
    pub height: u64,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(kind: RelationKind, source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            height,
            kind,
        }
    }

    pub fn transfer(
        source: impl Into<String>,
        target: impl Into<String>,
        amount: u64,
        source_balance: u64,
        target_balance: u64,
        height: u64,
    ) -> Self {
        Self::new(
            RelationKind::Transfer {
                amount,
                source_balance,
                target_balance,
            },
            source,
            target,
            height,
        )
    }

    pub fn upvote(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Upvote, source, target, height)
    }

    pub fn downvote(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Downvote, source, target, height)
    }

    pub fn trust(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Trust, source, target, height)
    }

    pub fn follow(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Follow, source, target, height)
    }

    pub fn ownership(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Ownership, source, target, height)
    }

    pub fn repost(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Repost, source, target, height)
    }

    pub fn membership(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Membership, source, target, height)
    }

    pub fn comment(source: impl Into<String>, target: impl Into<String>, height: u64) -> Self {
        Self::new(RelationKind::Comment, source, target, height)
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn policy(&self) -> RelationPolicy {
        self.kind.policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_policies() {
        let upvote = Relation::upvote("a", "p", 0).policy();
        assert_eq!(upvote.weight, 1);
        assert_eq!(upvote.reverse_weight, 0);
        assert!(upvote.decayable);
        assert_eq!((upvote.source_type, upvote.target_type), (NodeType::Account, NodeType::Content));

        let ownership = Relation::ownership("a", "p", 0).policy();
        assert_eq!((ownership.weight, ownership.reverse_weight), (1, 1));
        assert!(!ownership.decayable);

        let membership = Relation::membership("a", "o", 0).policy();
        assert_eq!(membership.target_type, NodeType::Organization);
        assert_eq!(membership.reverse_weight, 10);
    }

    #[test]
    fn test_transfer_policy_uses_amount() {
        let t = Relation::transfer("a", "b", 2_000, 10, 10, 5);
        let policy = t.policy();
        assert_eq!(policy.weight, 2_000);
        assert_eq!(policy.reverse_weight, -2_000);
        assert_eq!(t.name(), "TRANSFER");
    }

    #[test]
    fn test_from_parts_roundtrips_names() {
        let raw = RelationPolicy {
            weight: 5,
            reverse_weight: -1,
            decayable: false,
            source_type: NodeType::Content,
            target_type: NodeType::Account,
        };

        assert_eq!(RelationKind::from_parts("FOLLOW", raw, (0, 0)), RelationKind::Follow);

        let transfer = RelationKind::from_parts("TRANSFER", raw, (7, 8));
        assert_eq!(
            transfer,
            RelationKind::Transfer {
                amount: 5,
                source_balance: 7,
                target_balance: 8
            }
        );

        let custom = RelationKind::from_parts("BOOKMARK", raw, (0, 0));
        assert_eq!(custom.name(), "BOOKMARK");
        assert_eq!(custom.policy(), raw);
    }

    #[test]
    fn test_node_type_parsing() {
        assert_eq!("account".parse::<NodeType>().unwrap(), NodeType::Account);
        assert_eq!("ORGANIZATION".parse::<NodeType>().unwrap(), NodeType::Organization);
        assert!("USER".parse::<NodeType>().is_err());
    }
}
