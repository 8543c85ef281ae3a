//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn create_test_session(balance: Decimal, rounds_played: u32) -> PlayerSession {
        PlayerSession {
            player_id: "a@x.com".to_string(),
            session_id: "s1".to_string(),
            balance,
            rounds_played,
            is_over: false,
            balance_history: vec![balance],
            dirty: false,
            max_rounds: 100,
        }
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Heads).unwrap(), "\"HEADS\"");
        assert_eq!(serde_json::to_string(&Side::Tails).unwrap(), "\"TAILS\"");
    }

    #[test]
    fn test_side_deserialization() {
        let heads: Side = serde_json::from_str("\"HEADS\"").unwrap();
        let tails: Side = serde_json::from_str("\"TAILS\"").unwrap();
        assert_eq!(heads, Side::Heads);
        assert_eq!(tails, Side::Tails);
    }

    #[test]
    fn test_side_from_str() {
        assert_eq!("h".parse::<Side>().unwrap(), Side::Heads);
        assert_eq!(" Tails ".parse::<Side>().unwrap(), Side::Tails);
        assert!("edge".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Heads.opposite(), Side::Tails);
        assert_eq!(Side::Tails.opposite(), Side::Heads);
    }

    #[test]
    fn test_rounds_remaining() {
        assert_eq!(create_test_session(dec!(25), 0).rounds_remaining(), 100);
        assert_eq!(create_test_session(dec!(25), 99).rounds_remaining(), 1);
        assert_eq!(create_test_session(dec!(25), 100).rounds_remaining(), 0);
    }

    #[test]
    fn test_suggested_wager_is_tenth_of_balance() {
        let session = create_test_session(dec!(25.00), 0);
        assert_eq!(session.suggested_wager(), dec!(2.50));

        let session = create_test_session(dec!(12.34), 0);
        assert_eq!(session.suggested_wager(), dec!(1.23));
    }

    #[test]
    fn test_suggested_wager_floor_and_cap() {
        // 10% of 0.05 rounds to 0.01 (floor)
        let session = create_test_session(dec!(0.05), 0);
        assert_eq!(session.suggested_wager(), dec!(0.01));

        // never more than the balance itself
        let session = create_test_session(dec!(0.004), 0);
        assert_eq!(session.suggested_wager(), dec!(0.004));
    }

    #[test]
    fn test_to_stored() {
        let mut session = create_test_session(dec!(30.00), 1);
        session.is_over = true;
        let stored = session.to_stored();
        assert_eq!(stored.balance, dec!(30.00));
        assert_eq!(stored.rounds_played, 1);
        assert!(stored.is_over);
    }

    #[test]
    fn test_wager_outcome_serialization() {
        let outcome = WagerOutcome {
            round: 1,
            wager: dec!(5.00),
            predicted: Side::Heads,
            outcome: Side::Heads,
            won: true,
            balance: dec!(30.00),
            is_over: false,
            just_finished: false,
            persisted: true,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"predicted\":\"HEADS\""));
        assert!(json.contains("\"balance\":\"30.00\""));
    }
}
