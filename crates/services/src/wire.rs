//! JSON shapes of the two dashboard endpoints.
//!
//! Leaderboard regions are decoded one by one from a `serde_json::Value`, so a
//! malformed region is dropped without taking the rest of the response with it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use eco_core::model::{LeaderboardSnapshot, PeerStanding, Tier, UserId, UserStanding};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub(crate) struct JoinRequest<'a> {
    pub challenge_id: &'a str,
    pub csrf_token: &'a str,
}

/// Successful join acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinReceipt {
    pub message: Option<String>,
}

/// PHP backends are loose about numbers; accept `12`, `12.0` and `"12"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(u64),
    Float(f64),
    Text(String),
}

impl Numeric {
    fn to_u64(&self) -> Option<u64> {
        match self {
            Numeric::Int(value) => Some(*value),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Numeric::Float(value) if value.is_finite() && *value >= 0.0 => {
                Some(value.round() as u64)
            }
            Numeric::Float(_) => None,
            Numeric::Text(raw) => raw.trim().parse().ok(),
        }
    }

    fn to_u32(&self) -> Option<u32> {
        self.to_u64().and_then(|value| u32::try_from(value).ok())
    }
}

#[derive(Debug, Deserialize)]
struct TierDto {
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct StandingDto {
    id: Numeric,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    school_name: Option<String>,
    eco_points: Numeric,
    tier: TierDto,
    #[serde(default)]
    total_badges: Option<Numeric>,
    #[serde(default)]
    rank: Option<Numeric>,
    #[serde(default)]
    computed_rank: Option<Numeric>,
    #[serde(default)]
    total_students: Option<Numeric>,
}

impl StandingDto {
    fn display_name(&self) -> String {
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return joined;
        }
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Student")
            .to_owned()
    }

    fn total_badges(&self) -> Option<u32> {
        match &self.total_badges {
            Some(value) => value.to_u32(),
            None => Some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankSource {
    /// Server-computed rank (personal window).
    Computed,
    /// 1-based position in the list (global top).
    Position,
}

fn decode_user(value: &Value) -> Option<UserStanding> {
    let dto = StandingDto::deserialize(value).ok()?;
    Some(UserStanding {
        id: UserId::new(dto.id.to_u64()?),
        name: dto.display_name(),
        eco_points: dto.eco_points.to_u64()?,
        total_badges: dto.total_badges()?,
        rank: dto.rank.as_ref().and_then(Numeric::to_u32).filter(|rank| *rank >= 1),
        total_participants: dto.total_students.as_ref().and_then(Numeric::to_u32),
        tier: Tier::new(dto.tier.name, dto.tier.slug),
        school_name: dto.school_name,
    })
}

fn decode_peer(value: &Value, position: usize, source: RankSource) -> Option<PeerStanding> {
    let dto = StandingDto::deserialize(value).ok()?;
    let positional = u32::try_from(position + 1).ok()?;
    let rank = match source {
        RankSource::Position => positional,
        RankSource::Computed => dto
            .computed_rank
            .as_ref()
            .or(dto.rank.as_ref())
            .and_then(Numeric::to_u32)
            .filter(|rank| *rank >= 1)
            .unwrap_or(positional),
    };
    Some(PeerStanding {
        id: UserId::new(dto.id.to_u64()?),
        name: dto.display_name(),
        eco_points: dto.eco_points.to_u64()?,
        total_badges: dto.total_badges()?,
        rank,
        tier: Tier::new(dto.tier.name, dto.tier.slug),
        school_name: dto.school_name,
    })
}

/// A region is usable only if it is an array whose every row decodes.
fn decode_rows(value: &Value, source: RankSource) -> Option<Vec<PeerStanding>> {
    value
        .as_array()?
        .iter()
        .enumerate()
        .map(|(position, row)| decode_peer(row, position, source))
        .collect()
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ApiError::Malformed("expected a JSON object".into())),
        Err(err) => Err(ApiError::Malformed(err.to_string())),
    }
}

fn ensure_success(object: &Map<String, Value>) -> Result<(), ApiError> {
    if object.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    Err(ApiError::Application {
        message: object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

pub(crate) fn decode_leaderboard(body: &[u8]) -> Result<LeaderboardSnapshot, ApiError> {
    let object = parse_object(body)?;
    ensure_success(&object)?;

    Ok(LeaderboardSnapshot {
        user: object.get("user").and_then(decode_user),
        personal_window: object
            .get("personal_window")
            .and_then(|window| window.get("rows"))
            .and_then(|rows| decode_rows(rows, RankSource::Computed)),
        global_top: object
            .get("global_top")
            .and_then(|rows| decode_rows(rows, RankSource::Position)),
    })
}

pub(crate) fn decode_join(body: &[u8]) -> Result<JoinReceipt, ApiError> {
    let object = parse_object(body)?;
    ensure_success(&object)?;
    Ok(JoinReceipt {
        message: object
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn row(id: u64, first: &str, points: &str) -> String {
        format!(
            r#"{{"id":{id},"first_name":"{first}","last_name":"Green","school_name":null,
                "eco_points":"{points}","tier":{{"name":"Sapling","slug":"sapling"}},
                "total_badges":2,"computed_rank":{id}}}"#
        )
    }

    #[test]
    fn decodes_all_regions() {
        let body = format!(
            r#"{{"success":true,
                "user":{{"id":2,"first_name":"Ada","last_name":"Green","eco_points":1200,
                         "tier":{{"name":"Sapling","slug":"sapling"}},"rank":2,
                         "total_students":40,"total_badges":3}},
                "personal_window":{{"rows":[{},{}]}},
                "global_top":[{}]}}"#,
            row(1, "Bo", "1500"),
            row(2, "Ada", "1200"),
            row(1, "Bo", "1500"),
        );

        let snapshot = decode_leaderboard(body.as_bytes()).unwrap();
        let user = snapshot.user.unwrap();
        assert_eq!(user.name, "Ada Green");
        assert_eq!(user.rank, Some(2));
        assert_eq!(user.total_participants, Some(40));

        let window = snapshot.personal_window.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].eco_points, 1500);
        assert_eq!(window[1].rank, 2);
        assert_eq!(snapshot.global_top.unwrap()[0].rank, 1);
    }

    #[test]
    fn malformed_region_is_dropped_alone() {
        let body = format!(
            r#"{{"success":true,"personal_window":{{"rows":"oops"}},"global_top":[{}]}}"#,
            row(5, "Cy", "10")
        );
        let snapshot = decode_leaderboard(body.as_bytes()).unwrap();
        assert!(snapshot.user.is_none());
        assert!(snapshot.personal_window.is_none());
        assert_eq!(snapshot.global_top.unwrap().len(), 1);
    }

    #[test]
    fn one_bad_row_invalidates_its_region() {
        let body = format!(
            r#"{{"success":true,"global_top":[{},{{"id":"x"}}]}}"#,
            row(1, "Bo", "1")
        );
        let snapshot = decode_leaderboard(body.as_bytes()).unwrap();
        assert!(snapshot.global_top.is_none());
    }

    #[test]
    fn missing_or_false_success_is_application_failure() {
        let err = decode_leaderboard(br#"{"global_top":[]}"#).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Application);
        let err = decode_leaderboard(br#"{"success":false}"#).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Application);
    }

    #[test]
    fn non_json_is_malformed() {
        assert_eq!(
            decode_leaderboard(b"<html>").unwrap_err().kind(),
            FailureKind::Malformed
        );
        assert_eq!(decode_join(b"[1,2]").unwrap_err().kind(), FailureKind::Malformed);
    }

    #[test]
    fn join_failure_keeps_server_message() {
        let err = decode_join(br#"{"success":false,"message":"Challenge closed"}"#).unwrap_err();
        assert_eq!(err.server_message(), Some("Challenge closed"));
        let receipt = decode_join(br#"{"success":true}"#).unwrap();
        assert_eq!(receipt.message, None);
    }
}
