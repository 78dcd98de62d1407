use std::collections::HashSet;

use crate::models::RecommendationResult;

/// Drop later duplicates of the same `full_name`, preserving first-seen
/// order. A second safety net behind the engine's per-call dedup set, and
/// idempotent: applying it to its own output changes nothing.
pub fn dedup_by_full_name(results: Vec<RecommendationResult>) -> Vec<RecommendationResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.full_name.clone()))
        .collect()
}

/// How well a recommendation matches the user's declared preferences:
/// +2 when its primary language is one of the user's languages, +1 for
/// each of its topics the user also declared.
fn match_score(result: &RecommendationResult, languages: &[String], topics: &[String]) -> i64 {
    let mut score = 0;

    if !result.language.is_empty()
        && languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(&result.language))
    {
        score += 2;
    }

    for topic in &result.topics {
        if topics.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
            score += 1;
        }
    }

    score
}

/// Deduplicate by `full_name` and order best matches first. The sort is
/// stable, so equally scored entries keep their prior relative order.
pub fn rank(
    results: Vec<RecommendationResult>,
    languages: &[String],
    topics: &[String],
) -> Vec<RecommendationResult> {
    let mut deduped = dedup_by_full_name(results);
    deduped.sort_by_key(|r| std::cmp::Reverse(match_score(r, languages, topics)));
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(full_name: &str, language: &str, topics: &[&str]) -> RecommendationResult {
        RecommendationResult {
            repo_url: format!("https://github.com/{full_name}"),
            full_name: full_name.to_string(),
            description: String::new(),
            stargazers_count: 0,
            forks_count: 0,
            open_issues_count: 0,
            avatar_url: String::new(),
            language: language.to_string(),
            updated_at: String::new(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_match_score_example() {
        let languages = strings(&["Python", "JavaScript"]);
        let topics = strings(&["machine-learning", "data-science", "web", "visualization"]);

        let ml = result("a/ml", "Python", &["machine-learning", "data-science"]);
        let rails = result("b/rails", "Ruby", &["rails", "web"]);

        assert_eq!(match_score(&ml, &languages, &topics), 4);
        assert_eq!(match_score(&rails, &languages, &topics), 1);
    }

    #[test]
    fn test_rank_orders_best_match_first() {
        let languages = strings(&["Python", "JavaScript"]);
        let topics = strings(&["machine-learning", "data-science", "web", "visualization"]);

        let ranked = rank(
            vec![
                result("b/rails", "Ruby", &["rails", "web"]),
                result("a/ml", "Python", &["machine-learning", "data-science"]),
            ],
            &languages,
            &topics,
        );

        assert_eq!(ranked[0].full_name, "a/ml");
        assert_eq!(ranked[1].full_name, "b/rails");
    }

    #[test]
    fn test_rank_is_stable_for_equal_scores() {
        let languages = strings(&["Go"]);
        let topics = strings(&[]);

        let ranked = rank(
            vec![
                result("first/repo", "Rust", &[]),
                result("second/repo", "Rust", &[]),
                result("third/repo", "Rust", &[]),
            ],
            &languages,
            &topics,
        );

        let names: Vec<&str> = ranked.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["first/repo", "second/repo", "third/repo"]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let languages = strings(&["Python"]);
        let topics = strings(&["web"]);

        let input = vec![
            result("a/one", "Python", &["web"]),
            result("b/two", "Ruby", &["web"]),
            result("c/three", "Go", &[]),
        ];

        let once = rank(input, &languages, &topics);
        let twice = rank(once.clone(), &languages, &topics);

        let order_once: Vec<&str> = once.iter().map(|r| r.full_name.as_str()).collect();
        let order_twice: Vec<&str> = twice.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(order_once, order_twice);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let deduped = dedup_by_full_name(vec![
            result("a/one", "Python", &["web"]),
            result("a/one", "Ruby", &[]),
            result("b/two", "Go", &[]),
        ]);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].full_name, "a/one");
        assert_eq!(deduped[0].language, "Python");
    }

    #[test]
    fn test_language_match_is_case_insensitive() {
        let languages = strings(&["python"]);
        let r = result("a/one", "Python", &[]);
        assert_eq!(match_score(&r, &languages, &[]), 2);
    }
}
