//! Declarative classification rules (loaded from `config/classifier.toml`).
//!
//! Each rule maps a category to primary keywords (weighted), context
//! keywords (low weight), and a priority weight. Rules are data, not code:
//! extending a category is a config edit, never a pipeline change. A small
//! denylist of promotional phrases rejects a candidate outright.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::article::Category;

pub const DEFAULT_RULES_PATH: &str = "config/classifier.toml";
pub const ENV_RULES_PATH: &str = "CLASSIFIER_RULES_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRule {
    pub category: Category,
    /// Primary keywords; each hit scores `weight`.
    pub keywords: Vec<String>,
    /// Context keywords; each hit scores 1.
    #[serde(default)]
    pub context: Vec<String>,
    /// Priority weight applied per primary-keyword hit.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<CategoryRule>,
    /// Promotional/spam phrases; any hit rejects the candidate.
    #[serde(default)]
    pub denylist: Vec<String>,
}

impl RuleSet {
    /// Load from `$CLASSIFIER_RULES_PATH`, then `config/classifier.toml`,
    /// falling back to the embedded seed when neither file is readable.
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_RULES_PATH).unwrap_or_else(|_| DEFAULT_RULES_PATH.to_string());
        Self::load_from_file(&path).unwrap_or_else(Self::default_seed)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Self::from_toml_str(&content).ok()
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let set: RuleSet = toml::from_str(s)?;
        Ok(set)
    }

    /// Built-in seed mirroring the site's sections. Used when no config file
    /// is present, so the fallback tier always works without I/O.
    pub fn default_seed() -> Self {
        fn rule(category: Category, weight: u32, keywords: &[&str], context: &[&str]) -> CategoryRule {
            CategoryRule {
                category,
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
                context: context.iter().map(|s| s.to_string()).collect(),
                weight,
            }
        }

        RuleSet {
            rules: vec![
                rule(
                    Category::Economy,
                    3,
                    &[
                        "وزير المالية",
                        "البنك المركزي",
                        "الاقتصاد",
                        "الميزانية",
                        "البورصة",
                        "أسعار الفائدة",
                        "التضخم",
                        "استثمار",
                    ],
                    &["أسعار", "سوق", "نمو", "عملة", "دولار", "مصرف"],
                ),
                rule(
                    Category::Politics,
                    3,
                    &[
                        "رئيس الجمهورية",
                        "البرلمان",
                        "مجلس النواب",
                        "انتخابات",
                        "وزير الخارجية",
                        "الحكومة",
                        "حزب",
                    ],
                    &["سياسي", "قرار", "تصريح", "ائتلاف"],
                ),
                rule(
                    Category::Governorates,
                    2,
                    &["محافظة", "المحافظ", "محافظات", "البلدية", "مجلس محلي"],
                    &["مدينة", "قرية", "أهالي", "مشروعات خدمية"],
                ),
                rule(
                    Category::Ai,
                    3,
                    &[
                        "الذكاء الاصطناعي",
                        "ذكاء اصطناعي",
                        "التعلم الآلي",
                        "روبوت",
                        "خوارزمية",
                    ],
                    &["نموذج", "بيانات", "شبكة عصبية"],
                ),
                rule(
                    Category::Technology,
                    2,
                    &[
                        "تكنولوجيا",
                        "هاتف ذكي",
                        "تطبيق",
                        "إنترنت",
                        "آبل",
                        "جوجل",
                        "مايكروسوفت",
                    ],
                    &["تحديث", "إطلاق", "مستخدمين", "رقمي"],
                ),
                rule(
                    Category::Military,
                    3,
                    &["الجيش", "قوات مسلحة", "عسكري", "وزارة الدفاع", "صاروخ", "مناورات"],
                    &["عملية", "حدود", "سلاح"],
                ),
                rule(
                    Category::World,
                    2,
                    &[
                        "الأمم المتحدة",
                        "واشنطن",
                        "موسكو",
                        "بكين",
                        "الاتحاد الأوروبي",
                        "مجلس الأمن",
                    ],
                    &["دولي", "قمة", "العالم"],
                ),
                rule(
                    Category::Sports,
                    3,
                    &[
                        "كرة القدم",
                        "المنتخب",
                        "الدوري",
                        "مباراة",
                        "بطولة",
                        "أولمبياد",
                    ],
                    &["هدف", "فوز", "ملعب", "مدرب", "لاعب"],
                ),
                rule(
                    Category::Arts,
                    2,
                    &["فيلم", "مسلسل", "مهرجان", "فنان", "أغنية", "مسرح"],
                    &["جمهور", "عرض", "نجم"],
                ),
                rule(
                    Category::Cars,
                    2,
                    &["سيارة", "سيارات", "طراز جديد", "محرك", "كهربائية"],
                    &["موديل", "قيادة", "وقود"],
                ),
                rule(
                    Category::Science,
                    2,
                    &["علماء", "دراسة علمية", "فضاء", "ناسا", "اكتشاف"],
                    &["باحثون", "تجربة", "كوكب"],
                ),
                rule(
                    Category::Education,
                    2,
                    &["التعليم", "وزارة التربية", "مدارس", "جامعة", "امتحانات"],
                    &["مناهج", "العام الدراسي", "طلاب", "معلمين"],
                ),
                rule(
                    Category::Accidents,
                    3,
                    &["حادث", "حريق", "انفجار", "مصرع", "تصادم"],
                    &["إسعاف", "ضحايا", "إصابة", "الدفاع المدني"],
                ),
            ],
            denylist: [
                "اشترك الآن",
                "اضغط هنا",
                "عرض خاص",
                "خصم حصري",
                "اربح",
                "إعلان ممول",
                "رابط التسجيل",
                "click here",
                "buy now",
                "sponsored",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_covers_every_scored_section() {
        let set = RuleSet::default_seed();
        // The generic section is the fallback, never a scored rule.
        assert!(set.rules.iter().all(|r| r.category != Category::News));
        assert!(!set.denylist.is_empty());
    }

    #[serial_test::serial]
    #[test]
    fn env_override_wins_over_the_default_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rules.toml");
        std::fs::write(
            &path,
            r#"
denylist = []

[[rules]]
category = "رياضة"
keywords = ["مباراة"]
"#,
        )
        .unwrap();

        std::env::set_var(ENV_RULES_PATH, path.display().to_string());
        let set = RuleSet::load_default();
        std::env::remove_var(ENV_RULES_PATH);

        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].category, Category::Sports);
        // Unset weight takes the default.
        assert_eq!(set.rules[0].weight, 2);
    }

    #[test]
    fn toml_round_trip() {
        let toml = r#"
denylist = ["اشترك الآن"]

[[rules]]
category = "اقتصاد"
weight = 3
keywords = ["وزير المالية"]
context = ["أسعار"]
"#;
        let set = RuleSet::from_toml_str(toml).unwrap();
        assert_eq!(set.rules.len(), 1);
        assert_eq!(set.rules[0].category, Category::Economy);
        assert_eq!(set.rules[0].weight, 3);
        assert_eq!(set.denylist, vec!["اشترك الآن".to_string()]);
    }
}
