use std::fmt;

use super::ProblemId;

/// Difficulty band, derived from the problem number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn for_id(id: ProblemId) -> Self {
        match id.0 {
            0..10 => Self::Easy,
            10..20 => Self::Medium,
            _ => Self::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        })
    }
}

/// Topic bucket, guessed from keywords in the slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    LinearAlgebra,
    MachineLearning,
    DataStructures,
    Mathematics,
}

impl Category {
    pub const ALL: [Self; 4] = [
        Self::LinearAlgebra,
        Self::MachineLearning,
        Self::DataStructures,
        Self::Mathematics,
    ];

    pub fn for_slug(slug: &str) -> Self {
        let lower = slug.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        if has(&["matrix", "eigen"]) {
            Self::LinearAlgebra
        } else if has(&["regression", "learning"]) {
            Self::MachineLearning
        } else if has(&["tree", "graph"]) {
            Self::DataStructures
        } else {
            Self::Mathematics
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LinearAlgebra => "Linear Algebra",
            Self::MachineLearning => "Machine Learning",
            Self::DataStructures => "Data Structures",
            Self::Mathematics => "Mathematics",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_bands() {
        assert_eq!(Difficulty::for_id(ProblemId(0)), Difficulty::Easy);
        assert_eq!(Difficulty::for_id(ProblemId(9)), Difficulty::Easy);
        assert_eq!(Difficulty::for_id(ProblemId(10)), Difficulty::Medium);
        assert_eq!(Difficulty::for_id(ProblemId(19)), Difficulty::Medium);
        assert_eq!(Difficulty::for_id(ProblemId(20)), Difficulty::Hard);
    }

    #[test]
    fn test_category_keywords() {
        assert_eq!(
            Category::for_slug("calculate_eigenvalues"),
            Category::LinearAlgebra
        );
        assert_eq!(
            Category::for_slug("linear_regression_normal_equation"),
            Category::MachineLearning
        );
        assert_eq!(Category::for_slug("decision_tree"), Category::DataStructures);
        assert_eq!(
            Category::for_slug("calculate_mean_by_row_or_column"),
            Category::Mathematics
        );
    }

    #[test]
    fn test_category_matching_is_case_insensitive() {
        assert_eq!(Category::for_slug("Matrix_Inverse"), Category::LinearAlgebra);
    }
}
