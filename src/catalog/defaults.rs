//! Built-in category set used to seed a fresh index.

use super::model::Category;

struct Seed {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    meta_description: &'static str,
    keywords: &'static [&'static str],
    featured: bool,
}

const SEEDS: &[Seed] = &[
    Seed {
        slug: "elsa-coloring-pages",
        title: "Elsa Coloring Pages",
        description: "Beautiful Elsa coloring pages featuring the beloved Frozen princess. Perfect for kids who love Disney's magical ice queen.",
        meta_description: "Free printable Elsa coloring pages for kids. Download and print beautiful Frozen princess designs featuring Queen Elsa.",
        keywords: &["elsa", "frozen", "disney", "princess", "coloring pages", "kids", "printable"],
        featured: true,
    },
    Seed {
        slug: "cars-coloring-pages",
        title: "Cars Coloring Pages",
        description: "Exciting car coloring pages with racing cars, sports cars, and everyday vehicles. Perfect for young car enthusiasts.",
        meta_description: "Free printable car coloring pages for kids. Download racing cars, sports cars, and vehicle designs to color.",
        keywords: &["cars", "vehicles", "racing", "sports cars", "coloring pages", "kids", "printable"],
        featured: true,
    },
    Seed {
        slug: "animals-coloring-pages",
        title: "Animals Coloring Pages",
        description: "Adorable animal coloring pages featuring cute pets, wild animals, and farm animals. Great for learning about nature.",
        meta_description: "Free printable animal coloring pages for kids. Download cute pets, wild animals, and farm animal designs.",
        keywords: &["animals", "pets", "wild animals", "farm animals", "nature", "coloring pages", "kids", "printable"],
        featured: true,
    },
    Seed {
        slug: "princess-coloring-pages",
        title: "Princess Coloring Pages",
        description: "Magical princess coloring pages with beautiful gowns, castles, and fairy tale scenes. Perfect for little dreamers.",
        meta_description: "Free printable princess coloring pages for kids. Download beautiful princess designs with gowns and castles.",
        keywords: &["princess", "fairy tale", "castles", "gowns", "magic", "coloring pages", "kids", "printable"],
        featured: true,
    },
    Seed {
        slug: "dinosaurs-coloring-pages",
        title: "Dinosaurs Coloring Pages",
        description: "Exciting dinosaur coloring pages with T-Rex, Triceratops, and other prehistoric creatures. Educational and fun!",
        meta_description: "Free printable dinosaur coloring pages for kids. Download T-Rex, Triceratops, and prehistoric creature designs.",
        keywords: &["dinosaurs", "prehistoric", "t-rex", "triceratops", "educational", "coloring pages", "kids", "printable"],
        featured: false,
    },
    Seed {
        slug: "flowers-coloring-pages",
        title: "Flowers Coloring Pages",
        description: "Beautiful flower coloring pages with roses, sunflowers, and garden blooms. Perfect for nature lovers.",
        meta_description: "Free printable flower coloring pages for kids. Download beautiful roses, sunflowers, and garden bloom designs.",
        keywords: &["flowers", "roses", "sunflowers", "garden", "nature", "coloring pages", "kids", "printable"],
        featured: false,
    },
];

/// The default categories, freshly allocated.
pub fn default_categories() -> Vec<Category> {
    SEEDS
        .iter()
        .map(|seed| Category {
            slug: seed.slug.to_string(),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            meta_description: seed.meta_description.to_string(),
            keywords: seed.keywords.iter().map(|k| k.to_string()).collect(),
            images: Vec::new(),
            featured: seed.featured,
        })
        .collect()
}

/// Generated metadata for a category discovered on disk or created without
/// descriptive fields.
pub(crate) fn generated_description(title: &str) -> String {
    format!("Beautiful {title} coloring pages for kids.")
}

pub(crate) fn generated_meta_description(title: &str) -> String {
    format!("Free printable {title} coloring pages for children.")
}

pub(crate) fn generated_keywords(subject: &str) -> Vec<String> {
    vec![
        subject.to_string(),
        "coloring pages".to_string(),
        "kids".to_string(),
        "printable".to_string(),
    ]
}
