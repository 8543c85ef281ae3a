//! End-of-session reporting
//!
//! Turns a session's balance history into the series and summary shown
//! when a game ends, and formats the final registry status.

use crate::types::PlayerSession;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `1234.5` -> `1,234.50`
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Registry text written when a session ends
pub fn final_status(balance: Decimal) -> String {
    format!("Finished - ${}", format_currency(balance))
}

/// One point of the balance-over-time chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub round: usize,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub player_id: String,
    pub rounds_played: u32,
    pub is_over: bool,
    pub opening_balance: Decimal,
    pub final_balance: Decimal,
    pub net_change: Decimal,
    pub peak_balance: Decimal,
    pub lowest_balance: Decimal,
    /// Rounds of this sitting only; history is not kept across resumes
    pub series: Vec<BalancePoint>,
    pub status: Option<String>,
}

impl SessionReport {
    pub fn from_session(session: &PlayerSession) -> Self {
        let history = &session.balance_history;
        let opening = history.first().copied().unwrap_or(session.balance);
        let peak = history.iter().copied().fold(opening, Decimal::max);
        let lowest = history.iter().copied().fold(opening, Decimal::min);

        let series = history
            .iter()
            .enumerate()
            .map(|(round, balance)| BalancePoint {
                round,
                balance: *balance,
            })
            .collect();

        Self {
            player_id: session.player_id.clone(),
            rounds_played: session.rounds_played,
            is_over: session.is_over,
            opening_balance: opening,
            final_balance: session.balance,
            net_change: session.balance - opening,
            peak_balance: peak,
            lowest_balance: lowest,
            series,
            status: session.is_over.then(|| final_status(session.balance)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session_with_history(history: Vec<Decimal>, is_over: bool) -> PlayerSession {
        PlayerSession {
            player_id: "a@x.com".to_string(),
            session_id: "s1".to_string(),
            balance: *history.last().unwrap(),
            rounds_played: (history.len() - 1) as u32,
            is_over,
            balance_history: history,
            dirty: false,
            max_rounds: 100,
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(0)), "0.00");
        assert_eq!(format_currency(dec!(30)), "30.00");
        assert_eq!(format_currency(dec!(4.5)), "4.50");
        assert_eq!(format_currency(dec!(999.999)), "1,000.00");
        assert_eq!(format_currency(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_currency(dec!(-1500)), "-1,500.00");
    }

    #[test]
    fn test_final_status() {
        assert_eq!(final_status(dec!(30.00)), "Finished - $30.00");
        assert_eq!(final_status(dec!(0.00)), "Finished - $0.00");
        assert_eq!(final_status(dec!(2048)), "Finished - $2,048.00");
    }

    #[test]
    fn test_report_series_and_extremes() {
        let session = session_with_history(
            vec![dec!(25), dec!(30), dec!(20), dec!(40), dec!(35)],
            false,
        );
        let report = SessionReport::from_session(&session);

        assert_eq!(report.series.len(), 5);
        assert_eq!(report.series[0], BalancePoint { round: 0, balance: dec!(25) });
        assert_eq!(report.series[4].balance, dec!(35));
        assert_eq!(report.opening_balance, dec!(25));
        assert_eq!(report.final_balance, dec!(35));
        assert_eq!(report.net_change, dec!(10));
        assert_eq!(report.peak_balance, dec!(40));
        assert_eq!(report.lowest_balance, dec!(20));
        assert_eq!(report.status, None);
    }

    #[test]
    fn test_report_for_finished_session() {
        let session = session_with_history(vec![dec!(3.00), dec!(0.00)], true);
        let report = SessionReport::from_session(&session);
        assert_eq!(report.net_change, dec!(-3.00));
        assert_eq!(report.status.as_deref(), Some("Finished - $0.00"));
    }

    #[test]
    fn test_resumed_session_report_starts_at_resumed_balance() {
        // a resumed session only knows the balance it was loaded with
        let session = session_with_history(vec![dec!(17.50)], false);
        let report = SessionReport::from_session(&session);
        assert_eq!(report.series.len(), 1);
        assert_eq!(report.opening_balance, dec!(17.50));
        assert_eq!(report.net_change, dec!(0));
    }
}
