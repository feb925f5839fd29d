mod balance_analyzer;

pub use balance_analyzer::{analyze_split_tree, ClassBalance, SplitBalance};
