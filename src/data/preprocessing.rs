//! Grouping of loaded relations into replayable blocks

use itertools::Itertools;

use crate::calculator::IndexCalculator;
use crate::graph::Relation;

/// Relations observed at one block height
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub height: u64,

    /// Heights without relations between the previous block and this one
    pub skipped_before: u64,

    pub relations: Vec<Relation>,
}

/// Sort relations by height and split them into one block per height.
///
/// Relations at the same height keep their input order.
pub fn group_into_blocks(mut relations: Vec<Relation>) -> Vec<Block> {
    relations.sort_by_key(|r| r.height);

    let mut blocks = Vec::new();
    let mut previous: Option<u64> = None;

    for (height, group) in &relations.into_iter().group_by(|r| r.height) {
        let skipped_before = previous.map_or(0, |p| height - p - 1);
        blocks.push(Block {
            height,
            skipped_before,
            relations: group.collect(),
        });
        previous = Some(height);
    }

    log::debug!("Grouped relations into {} blocks", blocks.len());
    blocks
}

/// Feed `blocks` to `calculator`, treating them as the block sequence its
/// handled-block count was taken from. Blocks (and gaps) the calculator has
/// already counted, e.g. after resuming from a snapshot of an earlier run
/// over the same input, are not applied again.
///
/// Returns the number of blocks whose relations were added.
pub fn replay(calculator: &IndexCalculator, blocks: &[Block]) -> usize {
    let already = calculator.get_total_handled_block_count();
    let mut position = 0;
    let mut added = 0;

    for block in blocks {
        position += block.skipped_before + 1;
        if position <= already {
            continue;
        }

        calculator.skip_blocks(block.skipped_before.min(position - 1 - already));
        calculator.add_block(&block.relations);
        added += 1;
    }

    if already > 0 {
        log::info!("Skipped {} blocks handled before resuming", blocks.len() - added);
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parameters;

    fn sample() -> Vec<Relation> {
        vec![
            Relation::follow("a", "b", 3),
            Relation::follow("b", "c", 5),
            Relation::trust("c", "a", 5),
            Relation::follow("c", "d", 9),
        ]
    }

    #[test]
    fn test_blocks_and_gaps() {
        let relations = vec![
            Relation::follow("a", "b", 7),
            Relation::follow("b", "c", 3),
            Relation::trust("c", "a", 7),
            Relation::follow("c", "d", 4),
        ];

        let blocks = group_into_blocks(relations);
        let summary: Vec<(u64, u64, usize)> = blocks
            .iter()
            .map(|b| (b.height, b.skipped_before, b.relations.len()))
            .collect();
        assert_eq!(summary, vec![(3, 0, 1), (4, 0, 1), (7, 2, 2)]);
        assert_eq!(blocks[2].relations[0].name(), "FOLLOW");
    }

    #[test]
    fn test_empty_input() {
        assert!(group_into_blocks(Vec::new()).is_empty());
    }

    #[test]
    fn test_replay_counts_gaps() {
        let calculator = IndexCalculator::new(Parameters::default()).unwrap();
        let blocks = group_into_blocks(sample());

        assert_eq!(replay(&calculator, &blocks), 3);
        // heights 3, 5 and 9: one block, a gap of 1, one block, a gap of 3, one block
        assert_eq!(calculator.get_total_handled_block_count(), 7);
    }

    #[test]
    fn test_replay_after_resume_does_not_double_count() {
        let blocks = group_into_blocks(sample());

        let first = IndexCalculator::new(Parameters::default()).unwrap();
        replay(&first, &blocks);
        let mut state = Vec::new();
        first.save_state(&mut state).unwrap();

        let resumed = IndexCalculator::new(Parameters::default()).unwrap();
        resumed.load_state(state.as_slice()).unwrap();
        assert_eq!(replay(&resumed, &blocks), 0);

        assert_eq!(resumed.get_total_handled_block_count(), 7);
        assert_eq!(resumed.calculate(), first.calculate());
    }

    #[test]
    fn test_replay_continues_a_partial_run() {
        let blocks = group_into_blocks(sample());

        let full = IndexCalculator::new(Parameters::default()).unwrap();
        replay(&full, &blocks);

        let partial = IndexCalculator::new(Parameters::default()).unwrap();
        replay(&partial, &blocks[..2]);
        assert_eq!(partial.get_total_handled_block_count(), 3);
        assert_eq!(replay(&partial, &blocks), 1);

        assert_eq!(partial.get_total_handled_block_count(), 7);
        assert_eq!(partial.calculate(), full.calculate());
    }
}
