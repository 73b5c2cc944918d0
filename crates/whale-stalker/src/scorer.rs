use std::cmp::Ordering;
use whale_core::DetectionConfig;

use crate::patterns::total_severity;
use crate::types::{
    ComponentScore, RiskTier, ScoreBreakdown, SuspiciousPattern, WalletAnalysis, WalletMetrics,
};

pub const EARLY_HIT_MAX_POINTS: f64 = 50.0;
pub const BUY_RANK_MAX_POINTS: f64 = 30.0;
pub const PATTERN_MAX_POINTS: f64 = 20.0;

/// Early hits at which the early-hit component saturates
const EARLY_HIT_SATURATION: f64 = 20.0;
const POINTS_PER_SEVERITY: f64 = 4.0;

const MODERATE_INTEREST_SCORE: f64 = 40.0;
const LOW_INTEREST_SCORE: f64 = 20.0;

/// Logarithmic whale scorer.
///
/// Both the early-hit and buy-rank components use diminishing returns instead of
/// linear steps, so there are no score cliffs between neighbouring inputs.
pub struct WalletScorer<'a> {
    config: &'a DetectionConfig,
}

impl<'a> WalletScorer<'a> {
    pub fn new(config: &'a DetectionConfig) -> Self {
        Self { config }
    }

    /// Composite score in [0, 100], rounded to 2 decimals
    pub fn score(&self, metrics: &WalletMetrics, patterns: &[SuspiciousPattern]) -> f64 {
        self.breakdown(metrics, patterns).total_score
    }

    /// Per-component view of the score, for audit and reporting
    pub fn breakdown(&self, metrics: &WalletMetrics, patterns: &[SuspiciousPattern]) -> ScoreBreakdown {
        let early_points = early_hit_points(metrics.early_hits);

        // No early buys and no recorded rank: nothing to award
        let rank_points = if metrics.early_buy_count == 0 && metrics.avg_buy_rank == 0.0 {
            0.0
        } else {
            buy_rank_points(metrics.avg_buy_rank, self.config.max_buy_rank)
        };

        let severity = total_severity(patterns);
        let pattern_points = pattern_points(severity);

        let pre_penalty_score = early_points + rank_points + pattern_points;
        let score_penalty = if metrics.score_penalty.is_finite() {
            metrics.score_penalty.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let total_score = round2((pre_penalty_score * score_penalty).clamp(0.0, 100.0));

        ScoreBreakdown {
            early_hit: ComponentScore {
                points: round2(early_points),
                max_points: EARLY_HIT_MAX_POINTS,
                details: format!("{} early hits (log-scaled)", metrics.early_hits),
            },
            buy_rank: ComponentScore {
                points: round2(rank_points),
                max_points: BUY_RANK_MAX_POINTS,
                details: format!("Average buy rank: {:.1}", metrics.avg_buy_rank),
            },
            pattern: ComponentScore {
                points: round2(pattern_points),
                max_points: PATTERN_MAX_POINTS,
                details: format!("{} patterns, total severity {}", patterns.len(), severity),
            },
            pre_penalty_score: round2(pre_penalty_score),
            score_penalty,
            total_score,
            tier: self.categorize(total_score),
        }
    }

    /// Map a score to its risk tier, evaluated from highest to lowest
    pub fn categorize(&self, score: f64) -> RiskTier {
        if score >= self.config.whale_score_alert {
            RiskTier::HighPriorityWhale
        } else if score >= self.config.whale_score_watchlist {
            RiskTier::Watchlist
        } else if score >= MODERATE_INTEREST_SCORE {
            RiskTier::ModerateInterest
        } else if score >= LOW_INTEREST_SCORE {
            RiskTier::LowInterest
        } else {
            RiskTier::MinimalInterest
        }
    }

    pub fn should_add_to_watchlist(&self, score: f64) -> bool {
        score >= self.config.whale_score_watchlist
    }

    pub fn should_send_alert(&self, score: f64) -> bool {
        score >= self.config.whale_score_alert
    }
}

/// `50 * ln(1 + hits) / ln(21)`, capped at 50
pub fn early_hit_points(early_hits: u32) -> f64 {
    if early_hits == 0 {
        return 0.0;
    }
    let points = EARLY_HIT_MAX_POINTS * (1.0 + early_hits as f64).ln() / (1.0 + EARLY_HIT_SATURATION).ln();
    points.clamp(0.0, EARLY_HIT_MAX_POINTS)
}

/// `30 * (1 - ln(rank) / ln(max_rank))` within (0, max_rank].
/// Non-positive ranks score the maximum, ranks past `max_rank` score nothing.
pub fn buy_rank_points(avg_buy_rank: f64, max_rank: f64) -> f64 {
    if avg_buy_rank <= 0.0 {
        return BUY_RANK_MAX_POINTS;
    }
    if avg_buy_rank > max_rank || max_rank <= 1.0 {
        return 0.0;
    }
    let points = BUY_RANK_MAX_POINTS * (1.0 - avg_buy_rank.ln() / max_rank.ln());
    points.clamp(0.0, BUY_RANK_MAX_POINTS)
}

/// Four points per severity level, capped at 20
pub fn pattern_points(total_severity: u32) -> f64 {
    (total_severity as f64 * POINTS_PER_SEVERITY).min(PATTERN_MAX_POINTS)
}

/// Highest score first, ties broken by address
pub fn sort_by_score(analyses: &mut [WalletAnalysis]) {
    analyses.sort_by(by_score);
}

/// Wallets scoring at least `min_score`, in `sort_by_score` order
pub fn rank_wallets(analyses: &[WalletAnalysis], min_score: f64) -> Vec<&WalletAnalysis> {
    let mut ranked: Vec<&WalletAnalysis> = analyses
        .iter()
        .filter(|a| a.whale_score >= min_score)
        .collect();
    ranked.sort_by(|a, b| by_score(a, b));
    ranked
}

fn by_score(a: &WalletAnalysis, b: &WalletAnalysis) -> Ordering {
    b.whale_score
        .total_cmp(&a.whale_score)
        .then_with(|| a.wallet_address.cmp(&b.wallet_address))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PatternName;

    fn metrics(early_hits: u32, avg_buy_rank: f64) -> WalletMetrics {
        WalletMetrics {
            total_trades: 10,
            early_hits,
            early_buy_count: early_hits.max(1),
            avg_buy_rank,
            ..Default::default()
        }
    }

    #[test]
    fn test_early_hit_component() {
        assert_eq!(early_hit_points(0), 0.0);
        assert!((early_hit_points(20) - 50.0).abs() < 1e-9);
        assert_eq!(early_hit_points(500), 50.0);
        assert!((early_hit_points(5) - 29.426).abs() < 0.01);
    }

    #[test]
    fn test_buy_rank_component_boundaries() {
        assert_eq!(buy_rank_points(0.0, 100.0), 30.0);
        assert_eq!(buy_rank_points(-3.0, 100.0), 30.0);
        assert_eq!(buy_rank_points(1.0, 100.0), 30.0);
        assert_eq!(buy_rank_points(0.5, 100.0), 30.0);
        assert!(buy_rank_points(100.0, 100.0).abs() < 1e-9);
        assert_eq!(buy_rank_points(100.5, 100.0), 0.0);
        assert!((buy_rank_points(10.0, 100.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_pattern_component_caps() {
        assert_eq!(pattern_points(0), 0.0);
        assert_eq!(pattern_points(3), 12.0);
        assert_eq!(pattern_points(5), 20.0);
        assert_eq!(pattern_points(25), 20.0);
    }

    #[test]
    fn test_rank_points_without_early_buy_count() {
        // Callers filling only early_hits and avg_buy_rank still get the rank component
        let config = DetectionConfig::default();
        let scorer = WalletScorer::new(&config);
        let m = WalletMetrics {
            total_trades: 40,
            wallet_age_days: 365,
            early_hits: 5,
            avg_buy_rank: 20.0,
            ..Default::default()
        };
        let patterns = vec![SuspiciousPattern::new(PatternName::ConsistentEarlyBuyer, 5, "")];

        let breakdown = scorer.breakdown(&m, &patterns);
        assert_eq!(breakdown.buy_rank.points, 10.48);
        assert_eq!(breakdown.total_score, 59.91);
        assert_eq!(breakdown.tier, RiskTier::ModerateInterest);
    }

    #[test]
    fn test_rank_wallets_filters_and_orders() {
        let config = DetectionConfig::default();
        let scorer = WalletScorer::new(&config);
        let analysis = |wallet: &str, score: f64| {
            let m = WalletMetrics {
                wallet_address: wallet.to_string(),
                ..metrics(1, 50.0)
            };
            WalletAnalysis {
                wallet_address: wallet.to_string(),
                whale_score: score,
                tier: scorer.categorize(score),
                patterns: Vec::new(),
                breakdown: scorer.breakdown(&m, &[]),
                is_likely_insider: false,
                metrics: m,
            }
        };

        let analyses = vec![
            analysis("0xc", 42.0),
            analysis("0xa", 10.0),
            analysis("0xb", 42.0),
            analysis("0xd", 77.5),
        ];
        let ranked: Vec<&str> = rank_wallets(&analyses, 20.0)
            .iter()
            .map(|a| a.wallet_address.as_str())
            .collect();
        assert_eq!(ranked, vec!["0xd", "0xb", "0xc"]);

        let mut all = analyses.clone();
        sort_by_score(&mut all);
        assert_eq!(all[3].wallet_address, "0xa");
        assert_eq!(all[1].wallet_address, "0xb");
    }

    #[test]
    fn test_no_early_window_buys_earns_no_rank_points() {
        let config = DetectionConfig::default();
        let scorer = WalletScorer::new(&config);
        let empty = WalletMetrics::default();
        let breakdown = scorer.breakdown(&empty, &[]);
        assert_eq!(breakdown.buy_rank.points, 0.0);
        assert_eq!(breakdown.total_score, 0.0);
        assert_eq!(breakdown.tier, RiskTier::MinimalInterest);
    }

    #[test]
    fn test_penalty_scales_composite() {
        let config = DetectionConfig::default();
        let scorer = WalletScorer::new(&config);
        let patterns = vec![SuspiciousPattern::new(PatternName::ConsistentEarlyBuyer, 5, "")];

        let clean = metrics(8, 12.0);
        let penalized = WalletMetrics {
            score_penalty: 0.5,
            ..clean.clone()
        };

        let full = scorer.breakdown(&clean, &patterns);
        let half = scorer.breakdown(&penalized, &patterns);
        assert_eq!(full.pre_penalty_score, half.pre_penalty_score);
        assert!((half.total_score - full.total_score * 0.5).abs() <= 0.01);
    }

    #[test]
    fn test_score_is_clamped() {
        let config = DetectionConfig::default();
        let scorer = WalletScorer::new(&config);
        let patterns: Vec<SuspiciousPattern> = (0..5)
            .map(|_| SuspiciousPattern::new(PatternName::WalletCluster, 5, ""))
            .collect();

        let extreme = WalletMetrics {
            score_penalty: 7.0,
            ..metrics(u32::MAX, -50.0)
        };
        let score = scorer.score(&extreme, &patterns);
        assert!((0.0..=100.0).contains(&score));
        assert_eq!(score, 100.0);

        let negative_penalty = WalletMetrics {
            score_penalty: -1.0,
            ..metrics(3, 5.0)
        };
        assert_eq!(scorer.score(&negative_penalty, &patterns), 0.0);
    }

    #[test]
    fn test_tiers() {
        let config = DetectionConfig::default();
        let scorer = WalletScorer::new(&config);
        assert_eq!(scorer.categorize(80.0), RiskTier::HighPriorityWhale);
        assert_eq!(scorer.categorize(79.99), RiskTier::Watchlist);
        assert_eq!(scorer.categorize(60.0), RiskTier::Watchlist);
        assert_eq!(scorer.categorize(40.0), RiskTier::ModerateInterest);
        assert_eq!(scorer.categorize(20.0), RiskTier::LowInterest);
        assert_eq!(scorer.categorize(19.99), RiskTier::MinimalInterest);
        assert_eq!(RiskTier::Watchlist.label(), "WATCHLIST");

        assert!(scorer.should_add_to_watchlist(60.0));
        assert!(!scorer.should_send_alert(79.0));
        assert!(scorer.should_send_alert(80.0));
    }

    #[test]
    fn test_custom_thresholds_move_tiers() {
        let config = DetectionConfig {
            whale_score_watchlist: 50.0,
            whale_score_alert: 70.0,
            ..Default::default()
        };
        let scorer = WalletScorer::new(&config);
        assert_eq!(scorer.categorize(55.0), RiskTier::Watchlist);
        assert_eq!(scorer.categorize(70.0), RiskTier::HighPriorityWhale);
    }
}
