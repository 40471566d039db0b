use crate::{
	choose_best_split::{choose_best_split, NodeStats, Split},
	BranchNode, LeafNode, MaxFeatures, Node, Target, TrainError, TrainOptions, Tree,
};
use ndarray::prelude::*;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use std::{cmp::Ordering, collections::BinaryHeap, ops::Range};

/// Train `options.n_trees` trees in parallel. Tree `i` draws its bootstrap sample and feature subsets from a generator seeded with `options.seed + i`, so the result does not depend on scheduling.
pub(crate) fn train_forest<'a>(
	features: ArrayView2<'a, f32>,
	target: Target<'a>,
	options: &'a TrainOptions,
) -> Result<Vec<Tree>, TrainError> {
	if options.n_trees == 0 {
		return Err(TrainError::NoTrees);
	}
	let n_examples = features.nrows();
	let trees = (0..options.n_trees)
		.into_par_iter()
		.map(|tree_index| {
			let mut rng = Xoshiro256Plus::seed_from_u64(options.seed.wrapping_add(tree_index as u64));
			let examples_index = if options.bootstrap {
				(0..n_examples)
					.map(|_| rng.gen_range(0..n_examples))
					.collect()
			} else {
				(0..n_examples).collect()
			};
			TreeBuilder::new(features, target, options, examples_index, rng).build()
		})
		.collect();
	Ok(trees)
}

#[derive(Clone, Copy, Debug)]
enum SplitDirection {
	Left,
	Right,
}

struct QueueItem {
	/// Items in the priority queue will be sorted by the gain of the split.
	split: Split,
	/// The index of the parent branch and the side of it this node hangs from.
	parent: Option<(usize, SplitDirection)>,
	depth: usize,
	/// The range of `examples_index` that holds the examples in this node.
	examples_index_range: Range<usize>,
}

impl PartialEq for QueueItem {
	fn eq(&self, other: &Self) -> bool {
		self.split.gain == other.split.gain
	}
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for QueueItem {
	fn cmp(&self, other: &Self) -> Ordering {
		self.split
			.gain
			.partial_cmp(&other.split.gain)
			.unwrap_or(Ordering::Equal)
	}
}

/// Nodes whose impurity is at most this value are not split.
const MIN_IMPURITY_TO_SPLIT: f64 = 1e-12;

struct TreeBuilder<'a> {
	features: ArrayView2<'a, f32>,
	target: Target<'a>,
	options: &'a TrainOptions,
	/// The examples this tree is trained on, with repeats for a bootstrap sample. Every node owns a contiguous range of this vector.
	examples_index: Vec<usize>,
	rng: Xoshiro256Plus,
	nodes: Vec<Node>,
	queue: BinaryHeap<QueueItem>,
}

impl<'a> TreeBuilder<'a> {
	fn new(
		features: ArrayView2<'a, f32>,
		target: Target<'a>,
		options: &'a TrainOptions,
		examples_index: Vec<usize>,
		rng: Xoshiro256Plus,
	) -> TreeBuilder<'a> {
		TreeBuilder {
			features,
			target,
			options,
			examples_index,
			rng,
			nodes: Vec::new(),
			queue: BinaryHeap::new(),
		}
	}

	fn build(mut self) -> Tree {
		let n_examples = self.examples_index.len();
		let root_stats = NodeStats::compute(self.target, &self.examples_index);
		self.visit(None, 0, 0..n_examples, root_stats);
		while let Some(item) = self.queue.pop() {
			let QueueItem {
				split,
				parent,
				depth,
				examples_index_range,
			} = item;
			let node_index = self.nodes.len();
			// The child indexes are filled in when the children are added.
			self.nodes.push(Node::Branch(BranchNode {
				left_child_index: 0,
				right_child_index: 0,
				feature_index: split.feature_index,
				split_value: split.split_value,
			}));
			self.link(parent, node_index);
			let n_left = self.partition(&split, examples_index_range.clone());
			let left_range = examples_index_range.start..examples_index_range.start + n_left;
			let right_range = examples_index_range.start + n_left..examples_index_range.end;
			let left_stats = NodeStats::compute(self.target, &self.examples_index[left_range.clone()]);
			let right_stats =
				NodeStats::compute(self.target, &self.examples_index[right_range.clone()]);
			self.visit(
				Some((node_index, SplitDirection::Left)),
				depth + 1,
				left_range,
				left_stats,
			);
			self.visit(
				Some((node_index, SplitDirection::Right)),
				depth + 1,
				right_range,
				right_stats,
			);
		}
		Tree { nodes: self.nodes }
	}

	/// Queue the node for splitting if a valid split exists, otherwise add it to the tree as a leaf.
	fn visit(
		&mut self,
		parent: Option<(usize, SplitDirection)>,
		depth: usize,
		examples_index_range: Range<usize>,
		stats: NodeStats,
	) {
		let n_examples = examples_index_range.len();
		let can_split = n_examples >= self.options.min_examples_per_split.max(2)
			&& self
				.options
				.max_depth
				.map(|max_depth| depth < max_depth)
				.unwrap_or(true)
			&& stats.impurity() > MIN_IMPURITY_TO_SPLIT;
		let split = if can_split {
			let feature_indexes = self.choose_feature_indexes();
			choose_best_split(
				self.features,
				self.target,
				&self.examples_index[examples_index_range.clone()],
				&stats,
				&feature_indexes,
				self.options.min_examples_per_leaf,
			)
		} else {
			None
		};
		match split {
			Some(split) => self.queue.push(QueueItem {
				split,
				parent,
				depth,
				examples_index_range,
			}),
			None => {
				let node_index = self.nodes.len();
				self.nodes.push(Node::Leaf(LeafNode {
					values: stats.leaf_values(),
				}));
				self.link(parent, node_index);
			}
		}
	}

	fn choose_feature_indexes(&mut self) -> Vec<usize> {
		let n_features = self.features.ncols();
		match self.options.max_features {
			MaxFeatures::All => (0..n_features).collect(),
			MaxFeatures::Sqrt => {
				if n_features == 0 {
					return Vec::new();
				}
				let amount = ((n_features as f64).sqrt().ceil() as usize).min(n_features);
				let mut feature_indexes =
					rand::seq::index::sample(&mut self.rng, n_features, amount).into_vec();
				feature_indexes.sort_unstable();
				feature_indexes
			}
		}
	}

	/// Reorder the examples in `range` so those sent left come first, and return how many were sent left.
	fn partition(&mut self, split: &Split, range: Range<usize>) -> usize {
		let column = self.features.column(split.feature_index);
		let (left, right): (Vec<usize>, Vec<usize>) = self.examples_index[range.clone()]
			.iter()
			.partition(|example_index| column[**example_index] <= split.split_value);
		let n_left = left.len();
		for (slot, example_index) in self.examples_index[range]
			.iter_mut()
			.zip(left.into_iter().chain(right))
		{
			*slot = example_index;
		}
		n_left
	}

	fn link(&mut self, parent: Option<(usize, SplitDirection)>, child_index: usize) {
		if let Some((parent_index, direction)) = parent {
			if let Node::Branch(branch) = &mut self.nodes[parent_index] {
				match direction {
					SplitDirection::Left => branch.left_child_index = child_index,
					SplitDirection::Right => branch.right_child_index = child_index,
				}
			}
		}
	}
}
