use super::types::{EventType, NewPolicyEvent};

/// Curated policy friction events loaded at startup
pub fn seed_events() -> Vec<NewPolicyEvent> {
    vec![
        NewPolicyEvent::new("2022-02-24", "Russia", EventType::Sanctions, 9, "Russia-Ukraine war sanctions begin"),
        NewPolicyEvent::new("2022-03-09", "Russia", EventType::BankingCrisis, 10, "Russia removed from SWIFT"),
        NewPolicyEvent::new(
            "2023-02-28",
            "Nigeria",
            EventType::CapitalControl,
            7,
            "Nigeria naira devaluation and cash withdrawal limits",
        ),
        NewPolicyEvent::new(
            "2022-06-15",
            "Lebanon",
            EventType::BankingCrisis,
            8,
            "Lebanon banking crisis deepens, deposit withdrawals restricted",
        ),
        NewPolicyEvent::new("2023-03-10", "USA", EventType::BankingCrisis, 8, "Silicon Valley Bank collapse"),
        NewPolicyEvent::new(
            "2022-11-08",
            "Global",
            EventType::Regulatory,
            7,
            "FTX collapse triggers regulatory scrutiny",
        ),
        NewPolicyEvent::new("2023-06-05", "USA", EventType::Regulatory, 6, "SEC sues Binance and Coinbase"),
        NewPolicyEvent::new(
            "2021-09-24",
            "China",
            EventType::Regulatory,
            9,
            "China declares all crypto transactions illegal",
        ),
        NewPolicyEvent::new(
            "2023-08-09",
            "Argentina",
            EventType::CapitalControl,
            8,
            "Peso devaluation accelerates, capital flight",
        ),
        NewPolicyEvent::new("2022-05-09", "Global", EventType::Other, 9, "Terra/LUNA collapse"),
    ]
}
