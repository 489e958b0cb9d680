use crate::records::DiaryPost;
use crate::window::MonthWindow;

/// Count the posts attributed to a cast inside a window.
///
/// Diary authorship is free text, so attribution is an exact match after
/// trimming whitespace on both sides. Posts that match no roster name are
/// simply excluded.
pub fn posts_by(posts: &[DiaryPost], cast_name: &str, window: &MonthWindow) -> usize {
    let wanted = cast_name.trim();
    posts
        .iter()
        .filter(|p| p.author.trim() == wanted && window.contains(p.date))
        .count()
}

/// Under-posting signal: at most `multiplier` posts per worked day.
pub fn under_posting(posts: usize, worked_days: u64, multiplier: u64) -> bool {
    posts as u64 <= worked_days * multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn post(author: &str, month: u32, day: u32) -> DiaryPost {
        DiaryPost {
            author: author.into(),
            date: NaiveDate::from_ymd_opt(2026, month, day).unwrap(),
        }
    }

    #[test]
    fn attribution_trims_whitespace_but_stays_exact() {
        let window = MonthWindow::parse("2026-07").unwrap();
        let posts = vec![
            post(" Yuki ", 7, 3),
            post("Yuki", 7, 10),
            post("yuki", 7, 11),
            post("Yukiko", 7, 12),
        ];
        assert_eq!(posts_by(&posts, "Yuki", &window), 2);
    }

    #[test]
    fn posts_outside_window_are_excluded() {
        let window = MonthWindow::parse("2026-07").unwrap();
        let posts = vec![post("Yuki", 6, 30), post("Yuki", 7, 1), post("Yuki", 8, 1)];
        assert_eq!(posts_by(&posts, "Yuki", &window), 1);
    }

    #[test]
    fn under_posting_boundary_is_inclusive() {
        assert!(under_posting(20, 10, 2));
        assert!(!under_posting(21, 10, 2));
        assert!(under_posting(0, 0, 2));
    }
}
