use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::strategy::{Strategy, Urgency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    BlogPost,
    SocialMedia,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTemplate {
    pub id: String,
    pub title: String,
    pub content_type: TemplateKind,
    pub target_audience: String,
    pub key_messages: Vec<String>,
    pub suggested_length: String,
    pub urgency: Urgency,
    pub platforms: Vec<String>,
}

const SOCIAL_PLATFORMS: &[&str] = &["twitter", "facebook", "linkedin"];

/// Two templates per strategy: a long-form piece on the strategy's target
/// platforms and a short-form social pack on the fixed social set.
pub fn suggest_templates(strategies: &[Strategy]) -> Vec<ContentTemplate> {
    let mut templates = Vec::with_capacity(strategies.len() * 2);

    for strategy in strategies {
        templates.push(ContentTemplate {
            id: Uuid::new_v4().to_string(),
            title: format!("Response Strategy: {}", strategy.recommended_approach),
            content_type: TemplateKind::BlogPost,
            target_audience: "general_public".to_string(),
            key_messages: strategy.content_themes.clone(),
            suggested_length: "800-1200 words".to_string(),
            urgency: strategy.urgency,
            platforms: strategy.target_platforms.clone(),
        });

        templates.push(ContentTemplate {
            id: Uuid::new_v4().to_string(),
            title: "Social Media Response Pack".to_string(),
            content_type: TemplateKind::SocialMedia,
            target_audience: "social_followers".to_string(),
            key_messages: strategy.content_themes.iter().take(2).cloned().collect(),
            suggested_length: "280 characters".to_string(),
            urgency: strategy.urgency,
            platforms: SOCIAL_PLATFORMS.iter().map(|p| p.to_string()).collect(),
        });
    }

    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> Strategy {
        Strategy {
            id: "s1".to_string(),
            threat_type: "reputation".to_string(),
            recommended_approach: "Proactive reputation management".to_string(),
            suggested_tone: "professional".to_string(),
            urgency: Urgency::High,
            target_platforms: vec!["news".to_string(), "reddit".to_string()],
            content_themes: vec![
                "Transparency and accountability".to_string(),
                "Commitment to improvement".to_string(),
                "Value to community".to_string(),
            ],
        }
    }

    #[test]
    fn two_templates_per_strategy() {
        let templates = suggest_templates(&[strategy(), strategy()]);
        assert_eq!(templates.len(), 4);
    }

    #[test]
    fn long_form_uses_strategy_platforms_social_uses_fixed_set() {
        let templates = suggest_templates(&[strategy()]);

        let blog = &templates[0];
        assert_eq!(blog.content_type, TemplateKind::BlogPost);
        assert_eq!(blog.suggested_length, "800-1200 words");
        assert_eq!(blog.platforms, vec!["news", "reddit"]);
        assert_eq!(blog.key_messages.len(), 3);

        let social = &templates[1];
        assert_eq!(social.content_type, TemplateKind::SocialMedia);
        assert_eq!(social.suggested_length, "280 characters");
        assert_eq!(social.platforms, vec!["twitter", "facebook", "linkedin"]);
        assert_eq!(social.key_messages.len(), 2);
    }

    #[test]
    fn no_strategies_yield_no_templates() {
        assert!(suggest_templates(&[]).is_empty());
    }
}
