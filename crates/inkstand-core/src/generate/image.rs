//! Cover image generation.
//!
//! The theme is turned into an atmospheric illustration prompt. Image
//! generation never fails its caller: any provider error falls back to a
//! deterministic placeholder keyed by the theme.

use std::future::Future;

use inkstand_types::error::GenerationError;
use inkstand_types::post::slugify;

/// Trait for text-to-image backends.
///
/// Implementations live in inkstand-infra (e.g., `FalImageProvider`).
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Generate one image for `prompt` and return its URL.
    fn generate_image(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

pub struct ImageGenerator<P: ImageProvider> {
    provider: P,
}

impl<P: ImageProvider> ImageGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Image URL for `theme`; the placeholder on any failure.
    pub async fn generate(&self, theme: &str) -> String {
        let prompt = atmospheric_prompt(theme);
        tracing::info!(provider = self.provider.name(), theme, "generating cover image");
        match self.provider.generate_image(&prompt).await {
            Ok(url) => url,
            Err(e) => {
                let fallback = placeholder_image(theme);
                tracing::warn!(error = %e, fallback = %fallback, "image generation failed, using placeholder");
                fallback
            }
        }
    }
}

/// Deterministic placeholder image for `theme`.
pub fn placeholder_image(theme: &str) -> String {
    let seed = slugify(theme);
    let seed = if seed.is_empty() { "inkstand".to_string() } else { seed };
    format!("https://picsum.photos/seed/{seed}/1200/630")
}

const BASE_STYLE: &str = "Atmospheric narrative illustration with clean linework and textured color fields, evoking a sense of place and story. Soft, warm lighting creates gentle highlights and soft-edged shadows. The style blends detailed environmental elements with expressive character work.";

struct Scene {
    subject: &'static str,
    environment: &'static str,
    palette: &'static str,
    mood: &'static str,
}

/// Theme keywords, checked in order; the first hit picks the scene.
const SCENES: &[(&[&str], Scene)] = &[
    (
        &["travel", "city", "cities", "destination"],
        Scene {
            subject: "A thoughtful traveler with a backpack sitting at a small café table, studying a map or guidebook",
            environment: "bustling street scene with local architecture, street signs in foreign languages, vintage travel posters on walls, steam rising from coffee cups, glimpses of other travelers and locals",
            palette: "muted earth tones and warm ochres with pops of vibrant blues in signage, golden sunset lighting, and rich burgundy accents",
            mood: "wanderlust and discovery amidst vibrant cultural surroundings",
        },
    ),
    (
        &["food", "cooking", "recipe", "cuisine"],
        Scene {
            subject: "A person carefully preparing or enjoying a meal at a rustic wooden table",
            environment: "cozy kitchen or intimate restaurant setting with hanging herbs, vintage cookware, steam rising from dishes, warm pendant lighting, shelves lined with spices and ingredients",
            palette: "warm terracotta and cream tones with pops of fresh green herbs, golden lighting, and rich amber accents",
            mood: "culinary passion and comfort amidst aromatic surroundings",
        },
    ),
    (
        &["tech", "digital", "ai", "future"],
        Scene {
            subject: "A focused individual working at a sleek desk with modern devices, surrounded by subtle holographic displays",
            environment: "contemporary workspace with clean lines, soft ambient lighting from hidden sources, floating interface elements, plants adding organic warmth, city lights visible through large windows",
            palette: "cool blues and teals with warm accent lighting, metallic silver details, and pops of electric cyan",
            mood: "innovation and contemplation in a harmonious tech environment",
        },
    ),
    (
        &["nature", "mountain", "hiking", "outdoor"],
        Scene {
            subject: "An adventurer resting at a scenic overlook, consulting a trail map or enjoying a simple meal",
            environment: "mountain vista or forest clearing with detailed flora, weathered trail markers, camping gear, golden hour lighting filtering through trees, distant peaks or valleys",
            palette: "forest greens and earth browns with warm golden sunlight, deep blue sky accents, and rich sunset oranges",
            mood: "peaceful adventure and connection with nature",
        },
    ),
    (
        &["business", "work", "career", "professional"],
        Scene {
            subject: "A professional in a thoughtful moment, reviewing documents or planning at a well-organized workspace",
            environment: "modern office or co-working space with natural light, plants, organized shelving, quality materials, subtle technology integration, inspiring artwork",
            palette: "sophisticated grays and whites with warm wood accents, pops of professional blue, and soft natural lighting",
            mood: "focused determination and professional growth",
        },
    ),
    (
        &["health", "wellness", "fitness", "lifestyle"],
        Scene {
            subject: "A person in a moment of wellness - stretching, meditating, or preparing healthy food",
            environment: "serene space with natural elements, yoga mats or exercise equipment, fresh plants, natural lighting, water bottles, healthy ingredients",
            palette: "calming sage greens and soft whites with natural wood tones, gentle blue accents, and warm natural lighting",
            mood: "tranquil self-care and mindful living",
        },
    ),
    (
        &["art", "creative", "design", "culture"],
        Scene {
            subject: "An artist or creative person working intently at their craft, surrounded by tools and inspiration",
            environment: "artistic studio or creative space with easels, brushes, sketches on walls, natural light from large windows, organized chaos of creative materials",
            palette: "rich artistic colors with paint-splattered surfaces, warm studio lighting, vibrant accent colors, and textured backgrounds",
            mood: "creative flow and artistic inspiration",
        },
    ),
];

const DEFAULT_SCENE: Scene = Scene {
    subject: "A contemplative person engaged with the subject matter, reading or working at a comfortable setting",
    environment: "thoughtfully designed environment with books, plants, warm lighting, personal touches, and atmospheric details that suggest depth and story",
    palette: "balanced warm and cool tones with soft lighting, natural textures, and harmonious color relationships",
    mood: "quiet focus and intellectual engagement",
};

/// Keyword hit. Two-letter keywords ("ai") must stand alone as a word so
/// that e.g. "mountain" does not read as a tech theme.
fn mentions(theme: &str, keyword: &str) -> bool {
    if keyword.len() > 2 {
        return theme.contains(keyword);
    }
    theme
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

fn scene_for(theme: &str) -> &'static Scene {
    let lower = theme.to_lowercase();
    SCENES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| mentions(&lower, k)))
        .map(|(_, scene)| scene)
        .unwrap_or(&DEFAULT_SCENE)
}

/// Illustration prompt for a blog theme.
pub fn atmospheric_prompt(theme: &str) -> String {
    let scene = scene_for(theme);
    format!(
        "{BASE_STYLE} {} in {}. The mood is {}. {}. The composition uses a slightly elevated perspective with sharp focus on the main subject and their immediate environment, while background elements are subtly detailed for depth. Subtle paper texture or digital grain is visible throughout, creating an illustrative, story-book quality that invites the viewer into the narrative.",
        scene.subject, scene.environment, scene.mood, scene.palette
    )
}
