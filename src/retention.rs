//! Retention: bound the persisted collection to the configured cap,
//! keeping the most recent articles by date.

use crate::article::Article;

/// Sort newest-first and truncate to `max_articles`. Returns how many
/// entries were dropped. Pure function of the collection and the cap.
pub fn trim(articles: &mut Vec<Article>, max_articles: usize) -> usize {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
    if articles.len() <= max_articles {
        return 0;
    }
    let removed = articles.len() - max_articles;
    articles.truncate(max_articles);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{make_article_id, Category};
    use chrono::{TimeZone, Utc};

    fn art_on_day(day: u32) -> Article {
        let date = Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap();
        Article {
            id: make_article_id(&format!("خبر يوم {day}"), "وكالة", date),
            title: format!("خبر يوم {day}"),
            content: "نص".to_string(),
            excerpt: "نص".to_string(),
            category: Category::News,
            date,
            source: "وكالة".to_string(),
            image: "https://img.example.com/a.jpg".to_string(),
            featured: false,
            video_url: None,
            tags: vec![],
            reading_time: 1,
            original_link: None,
            is_translated: None,
        }
    }

    #[test]
    fn keeps_the_most_recent_cap_articles() {
        // Days 1..=5 stored, days 6 and 7 arrive: cap 5 keeps days 3..=7.
        let mut all: Vec<Article> = (1..=7).map(art_on_day).collect();
        let removed = trim(&mut all, 5);
        assert_eq!(removed, 2);
        let days: Vec<u32> = all
            .iter()
            .map(|a| a.title.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(days, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn under_cap_is_untouched() {
        let mut all: Vec<Article> = (1..=3).map(art_on_day).collect();
        assert_eq!(trim(&mut all, 5), 0);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn ordering_is_newest_first_even_without_removal() {
        let mut all: Vec<Article> = vec![art_on_day(2), art_on_day(9), art_on_day(4)];
        trim(&mut all, 10);
        assert!(all[0].date > all[1].date && all[1].date > all[2].date);
    }

    #[test]
    fn cap_of_zero_empties_the_store() {
        let mut all: Vec<Article> = (1..=3).map(art_on_day).collect();
        assert_eq!(trim(&mut all, 0), 3);
        assert!(all.is_empty());
    }
}
