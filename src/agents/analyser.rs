use std::collections::BTreeMap;

use crate::agents::parse_answer_pairs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub text: String,
    pub score: i32,
    pub total: i32,
}

impl Report {
    pub fn percent(&self) -> i32 {
        if self.total > 0 {
            self.score * 100 / self.total
        } else {
            0
        }
    }
}

/// Checks a student's answer sheet against the answer key. Questions the
/// student skipped count as wrong.
pub fn run(answer_key: &BTreeMap<u32, String>, user_text: &str) -> Report {
    let given: BTreeMap<u32, String> = parse_answer_pairs(user_text).into_iter().collect();

    let mut lines = vec!["Результаты проверки:".to_string()];
    let mut score = 0;
    for (number, expected) in answer_key {
        let line = match given.get(number) {
            Some(answer) if answer == expected => {
                score += 1;
                format!("{number}: верно ({answer})")
            }
            Some(answer) => {
                format!("{number}: неверно (ваш ответ: {answer}, правильный: {expected})")
            }
            None => format!("{number}: нет ответа (правильный: {expected})"),
        };
        lines.push(line);
    }

    let total = answer_key.len() as i32;
    let mut report = Report {
        text: String::new(),
        score,
        total,
    };
    lines.push(String::new());
    lines.push(format!("Итого: {score}/{total} ({}%)", report.percent()));
    report.text = lines.join("\n");
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> BTreeMap<u32, String> {
        BTreeMap::from([
            (1, "A".to_string()),
            (2, "C".to_string()),
            (3, "B".to_string()),
        ])
    }

    #[test]
    fn scores_matching_answers() {
        let report = run(&key(), "1a 2c 3d");
        assert_eq!(report.score, 2);
        assert_eq!(report.total, 3);
        assert_eq!(report.percent(), 66);
        assert!(report.text.contains("3: неверно (ваш ответ: D, правильный: B)"));
        assert!(report.text.ends_with("Итого: 2/3 (66%)"));
    }

    #[test]
    fn missing_answers_count_as_wrong() {
        let report = run(&key(), "2C");
        assert_eq!(report.score, 1);
        assert!(report.text.contains("1: нет ответа (правильный: A)"));
    }

    #[test]
    fn unspaced_and_comma_separated_sheets() {
        for sheet in ["1a2c3b", "1a,2c,3b", "1A, 2C, 3B"] {
            assert!(crate::agents::moderator::is_answer_sheet(sheet));
            let report = run(&key(), sheet);
            assert_eq!(report.score, 3, "sheet {sheet}");
            assert!(report.text.contains("1: верно (A)"));
        }
    }

    #[test]
    fn empty_key_scores_zero() {
        let report = run(&BTreeMap::new(), "1a");
        assert_eq!((report.score, report.total, report.percent()), (0, 0, 0));
    }
}
