use std::sync::Arc;
use std::thread;

use relation_rank::calculator::scale_scores_to_one;
use relation_rank::config::RankAlgorithm;
use relation_rank::graph::store::PHANTOM_LABEL;
use relation_rank::{IndexCalculator, NodeType, Parameters, Relation, Scores};

const BALANCE: u64 = 10_000_000_000_000;

fn transfer_params() -> Parameters {
    Parameters {
        transaction_amount_threshold: 10,
        account_amount_threshold: 10,
        ..Parameters::default()
    }
}

fn transfer(source: &str, target: &str, amount: u64) -> Relation {
    Relation::transfer(source, target, amount, BALANCE, BALANCE, 1)
}

fn total(scores: &Scores) -> f64 {
    scores.values().flat_map(|by_id| by_id.values()).sum()
}

fn score(scores: &Scores, node_type: NodeType, id: &str) -> f64 {
    scores[&node_type][id]
}

#[test]
fn test_transfer_ranking() {
    let calculator = IndexCalculator::for_transfer(transfer_params()).unwrap();
    calculator.add_block(&[
        transfer("a", "b", 2_000_000_000),
        transfer("b", "a", 1_000_000_000),
        transfer("a", "c", 3_000_000_000),
        transfer("c", "b", 5_000_000_000),
        transfer("b", "c", 7_000_000_000),
    ]);

    let scores = calculator.calculate();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[&NodeType::Account].len(), 3);

    assert!((score(&scores, NodeType::Account, "a") - 0.2013).abs() < 1e-3);
    assert!((score(&scores, NodeType::Account, "b") - 0.2492).abs() < 1e-3);
    assert!((score(&scores, NodeType::Account, "c") - 0.5496).abs() < 1e-3);
    assert!((total(&scores) - 1.0).abs() < 1e-6);
}

#[test]
fn test_small_transfers_are_ignored() {
    let calculator = IndexCalculator::for_transfer(transfer_params()).unwrap();
    calculator.add_block(&[
        transfer("a", "b", 2_000_000_000),
        // 5 USD, under the threshold
        transfer("a", "dust", 500_000_000),
        Relation::transfer("a", "poor", 2_000_000_000, BALANCE, 1, 1),
    ]);

    let scores = calculator.calculate();
    let accounts = &scores[&NodeType::Account];
    assert_eq!(accounts.len(), 2);
    assert!(!accounts.contains_key("dust"));
    assert!(!accounts.contains_key("poor"));
}

#[test]
fn test_transfer_calculator_ignores_social_relations() {
    let calculator = IndexCalculator::for_transfer(transfer_params()).unwrap();
    calculator.add_block(&[transfer("a", "b", 2_000_000_000), Relation::follow("a", "c", 1)]);

    // The filter rejects everything that is not a transfer
    let scores = calculator.calculate();
    assert!(!scores[&NodeType::Account].contains_key("c"));
}

#[test]
fn test_rank_mass_is_conserved() {
    for algorithm in [RankAlgorithm::PageRank, RankAlgorithm::NcdAwareRank] {
        let params = Parameters {
            algorithm,
            ..Parameters::default()
        };
        let calculator = IndexCalculator::new(params).unwrap();
        calculator.add_block(&[
            Relation::follow("a", "b", 1),
            Relation::follow("b", "c", 1),
            Relation::follow("c", "a", 1),
            Relation::trust("d", "a", 1),
            Relation::upvote("a", "post", 1),
            Relation::ownership("b", "post", 1),
        ]);

        let scores = calculator.calculate();
        assert!((total(&scores) - 1.0).abs() < 1e-6, "{:?}", algorithm);
        assert!(scores.values().flat_map(|s| s.values()).all(|&v| v > 0.0));
    }
}

#[test]
fn test_skipped_blocks_only_move_the_counter() {
    let calculator = IndexCalculator::new(Parameters::default()).unwrap();
    calculator.add_block(&[Relation::follow("a", "b", 1), Relation::follow("b", "c", 1)]);
    let before = calculator.calculate();

    calculator.skip_blocks(5);
    assert_eq!(calculator.get_total_handled_block_count(), 6);
    assert_eq!(calculator.calculate(), before);
}

#[test]
fn test_custom_filter_creates_no_ids() {
    let calculator =
        IndexCalculator::with_filter(Parameters::default(), |r: &Relation| r.source != "spam").unwrap();
    calculator.add_block(&[
        Relation::follow("a", "b", 1),
        Relation::follow("spam", "a", 1),
        Relation::follow("spam", "victim", 1),
    ]);

    let scores = calculator.calculate();
    let accounts = &scores[&NodeType::Account];
    assert_eq!(accounts.keys().map(String::as_str).collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn test_social_scores_hide_phantoms() {
    let calculator = IndexCalculator::for_social_network(Parameters::default()).unwrap();
    calculator.add_block(&[
        Relation::upvote("alice", "post", 1),
        Relation::downvote("bob", "post", 1),
        Relation::ownership("carol", "post", 1),
        Relation::membership("alice", "guild", 1),
    ]);

    let scores = calculator.calculate();
    assert_eq!(
        scores.keys().copied().collect::<Vec<_>>(),
        vec![NodeType::Account, NodeType::Content, NodeType::Organization]
    );
    for by_id in scores.values() {
        assert!(!by_id.contains_key(PHANTOM_LABEL));
    }
    assert_eq!(scores[&NodeType::Account].len(), 3);

    // Owners collect rank from their content
    let accounts = &scores[&NodeType::Account];
    assert!(accounts["carol"] > accounts["bob"]);
}

#[test]
fn test_social_downvotes_never_push_scores_negative() {
    let calculator = IndexCalculator::for_social_network(Parameters::default()).unwrap();
    calculator.add_block(&[Relation::upvote("erin", "other", 1)]);

    let downvotes: Vec<Relation> = (0..20)
        .map(|i| Relation::downvote(format!("v{}", i), "post", 2))
        .collect();
    calculator.add_block(&downvotes);

    let scores = calculator.calculate();
    assert!(scores[&NodeType::Content].contains_key("post"));
    for (node_type, by_id) in &scores {
        for (id, &value) in by_id {
            assert!(value >= 0.0, "{} {} scored {}", node_type, id, value);
        }
    }
}

#[test]
fn test_priority_shifts_rank() {
    let calculator = IndexCalculator::new(Parameters::default()).unwrap();
    calculator.add_block(&[
        Relation::follow("a", "b", 1),
        Relation::follow("b", "c", 1),
        Relation::follow("c", "a", 1),
        Relation::follow("d", "a", 1),
    ]);

    let uniform = calculator.calculate();

    let mut priority = Scores::new();
    priority.entry(NodeType::Account).or_default().insert("d".to_string(), 1.0);
    let shifted = calculator.calculate_with_priority(&priority);

    assert!(score(&shifted, NodeType::Account, "d") > score(&uniform, NodeType::Account, "d"));
    assert!((total(&shifted) - 1.0).abs() < 1e-6);

    // Nothing positive to go by: same as uniform
    let mut negative = Scores::new();
    negative.entry(NodeType::Account).or_default().insert("a".to_string(), -3.0);
    assert_eq!(calculator.calculate_with_priority(&negative), uniform);
}

#[test]
fn test_scaled_scores_sum_to_one() {
    let calculator = IndexCalculator::new(Parameters::default()).unwrap();
    calculator.add_block(&[Relation::follow("a", "b", 1), Relation::upvote("a", "p", 1)]);

    let scaled = scale_scores_to_one(&calculator.calculate());
    assert!((total(&scaled) - 1.0).abs() < 1e-12);
}

#[test]
fn test_blocks_from_many_threads() {
    let calculator = Arc::new(IndexCalculator::new(Parameters::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let calculator = Arc::clone(&calculator);
            thread::spawn(move || {
                for i in 0..25 {
                    let source = format!("t{}-{}", t, i);
                    calculator.add_block(&[Relation::follow(source, "hub", i)]);
                    if i % 10 == 0 {
                        calculator.calculate();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(calculator.get_total_handled_block_count(), 100);

    let scores = calculator.calculate();
    let accounts = &scores[&NodeType::Account];
    assert_eq!(accounts.len(), 101);

    let top = accounts
        .iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(id, _)| id.as_str());
    assert_eq!(top, Some("hub"));
}
