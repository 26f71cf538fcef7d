//! First-run taxonomy and sample cards

use rusqlite::{params, TransactionBehavior};

use super::search::index_card;
use super::sqlite::{format_timestamp, Result, Storage};
use crate::model::CardType;

struct PillarSeed {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
}

const PILLARS: &[PillarSeed] = &[
    PillarSeed { id: "technical-mastery", name: "Technical Mastery", icon: "Code2", color: "#6366f1" },
    PillarSeed { id: "financial-intelligence", name: "Financial Intelligence", icon: "TrendingUp", color: "#22c55e" },
    PillarSeed { id: "ai-symbiosis", name: "AI Symbiosis", icon: "Brain", color: "#a855f7" },
    PillarSeed { id: "cognitive-performance", name: "Cognitive Performance", icon: "Lightbulb", color: "#f59e0b" },
    PillarSeed { id: "professional-excellence", name: "Professional Excellence", icon: "Briefcase", color: "#3b82f6" },
    PillarSeed { id: "physical-wellbeing", name: "Physical & Mental Wellbeing", icon: "Heart", color: "#ef4444" },
];

/// (id, pillar, name, tier, sort order)
const DOMAINS: &[(&str, &str, &str, i32, i32)] = &[
    // Technical Mastery
    ("technical-mastery/python", "technical-mastery", "Python Ecosystem", 1, 1),
    ("technical-mastery/systems", "technical-mastery", "Systems & DevOps", 1, 2),
    ("technical-mastery/security", "technical-mastery", "Security & Pentesting", 1, 3),
    ("technical-mastery/ai-ml", "technical-mastery", "AI/ML/Deep Learning", 1, 4),
    ("technical-mastery/genai", "technical-mastery", "Generative AI & LLMs", 1, 5),
    ("technical-mastery/architecture", "technical-mastery", "Architecture & Patterns", 2, 1),
    ("technical-mastery/shell", "technical-mastery", "Shell & CLI", 2, 2),
    ("technical-mastery/c", "technical-mastery", "C", 2, 3),
    ("technical-mastery/cpp", "technical-mastery", "C++", 2, 4),
    ("technical-mastery/rust", "technical-mastery", "Rust", 2, 5),
    ("technical-mastery/go", "technical-mastery", "Go", 2, 6),
    ("technical-mastery/data-eng", "technical-mastery", "Data Engineering", 2, 7),
    ("technical-mastery/web", "technical-mastery", "Web Development", 2, 8),
    ("technical-mastery/dev-boards", "technical-mastery", "Dev Boards", 2, 9),
    ("technical-mastery/cad", "technical-mastery", "CAD & Digital Fabrication", 2, 10),
    ("technical-mastery/creative", "technical-mastery", "Creative Computing", 3, 1),
    ("technical-mastery/robotics", "technical-mastery", "Robotics & Control Systems", 3, 2),
    ("technical-mastery/audio", "technical-mastery", "Audio & Synthesis", 3, 3),
    // Financial Intelligence
    ("financial-intelligence/personal", "financial-intelligence", "Personal Finance", 1, 1),
    ("financial-intelligence/quant", "financial-intelligence", "Quantitative Finance", 1, 2),
    ("financial-intelligence/markets", "financial-intelligence", "Market Mechanics", 2, 1),
    // AI Symbiosis
    ("ai-symbiosis/literacy", "ai-symbiosis", "AI Literacy", 1, 1),
    ("ai-symbiosis/workflows", "ai-symbiosis", "AI-Augmented Workflows", 1, 2),
    ("ai-symbiosis/local", "ai-symbiosis", "Local & Private AI", 2, 1),
    // Cognitive Performance
    ("cognitive-performance/learning", "cognitive-performance", "Learning Science", 1, 1),
    ("cognitive-performance/focus", "cognitive-performance", "Focus & Deep Work", 1, 2),
    ("cognitive-performance/decisions", "cognitive-performance", "Decision-Making", 1, 3),
    ("cognitive-performance/problem-solving", "cognitive-performance", "Problem-Solving", 2, 1),
    // Professional Excellence
    ("professional-excellence/career", "professional-excellence", "Career Strategy", 1, 1),
    ("professional-excellence/leadership", "professional-excellence", "Leadership & Communication", 2, 1),
    ("professional-excellence/entrepreneurship", "professional-excellence", "Entrepreneurship", 2, 2),
    // Physical & Mental Wellbeing
    ("physical-wellbeing/sleep", "physical-wellbeing", "Sleep & Recovery", 1, 1),
    ("physical-wellbeing/exercise", "physical-wellbeing", "Exercise Science", 1, 2),
    ("physical-wellbeing/nutrition", "physical-wellbeing", "Nutrition", 2, 1),
    ("physical-wellbeing/stress", "physical-wellbeing", "Stress Management", 2, 2),
];

/// (id, domain, name, sort order)
const TOPICS: &[(&str, &str, &str, i32)] = &[
    ("technical-mastery/python/decorators", "technical-mastery/python", "Python Decorators", 1),
    ("technical-mastery/python/data-structures", "technical-mastery/python", "Data Structures", 2),
    ("cognitive-performance/learning/spaced-repetition", "cognitive-performance/learning", "Spaced Repetition", 1),
];

/// (topic, front, back)
const SAMPLE_CARDS: &[(&str, &str, &str)] = &[
    (
        "technical-mastery/python/decorators",
        "What does `functools.wraps` do when applied to a decorator's inner function?",
        "It copies the original function's `__name__`, `__doc__`, `__module__`, and other attributes to the wrapper function, preserving introspection and debugging capabilities.",
    ),
    (
        "technical-mastery/python/decorators",
        "What is the execution order when multiple decorators are stacked on a function?",
        "Decorators are applied bottom-up (closest to function first), but execute top-down when the decorated function is called. `@A\\n@B\\ndef f()` is equivalent to `f = A(B(f))`.",
    ),
    (
        "technical-mastery/python/data-structures",
        "What is the average time complexity of dictionary lookup in Python?",
        "O(1) average case. Python dicts use hash tables with open addressing. Worst case is O(n) due to hash collisions, but this is extremely rare with a good hash function.",
    ),
    (
        "cognitive-performance/learning/spaced-repetition",
        "What is the spacing effect?",
        "The spacing effect is the finding that information is better retained when study sessions are spaced out over time rather than massed together (cramming). First described by Ebbinghaus in 1885.",
    ),
    (
        "cognitive-performance/learning/spaced-repetition",
        "What does FSRS stand for and how does it improve upon SM-2?",
        "Free Spaced Repetition Scheduler. FSRS uses a machine learning model (DSR: Difficulty, Stability, Retrievability) to predict memory states, achieving 20-30% better scheduling efficiency than SM-2's fixed-interval algorithm.",
    ),
];

impl Storage {
    /// Populate pillars, domains and sample content on an empty database.
    ///
    /// Returns `false` without writing when any pillar already exists.
    pub fn seed_initial_data(&self) -> Result<bool> {
        let now = format_timestamp(self.now());
        let mut writer = self.lock_writer()?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let pillars: i64 = tx.query_row("SELECT COUNT(*) FROM pillars", [], |row| row.get(0))?;
        if pillars > 0 {
            return Ok(false);
        }

        for (order, pillar) in PILLARS.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO pillars (id, name, icon, color, sort_order) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![pillar.id, pillar.name, pillar.icon, pillar.color, order as i32 + 1],
            )?;
        }

        for (id, pillar_id, name, tier, sort_order) in DOMAINS {
            tx.execute(
                "INSERT OR IGNORE INTO domains (id, pillar_id, name, tier, sort_order) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, pillar_id, name, tier, sort_order],
            )?;
        }

        for (id, domain_id, name, sort_order) in TOPICS {
            tx.execute(
                "INSERT OR IGNORE INTO topics (id, domain_id, name, sort_order) VALUES (?1, ?2, ?3, ?4)",
                params![id, domain_id, name, sort_order],
            )?;
        }

        for (topic_id, front, back) in SAMPLE_CARDS {
            tx.execute(
                "INSERT INTO cards (topic_id, front, back, card_type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![topic_id, front, back, CardType::Basic.as_str(), now],
            )?;
            index_card(&tx, tx.last_insert_rowid(), front, back)?;
        }

        tx.commit()?;

        tracing::info!(
            pillars = PILLARS.len(),
            domains = DOMAINS.len(),
            cards = SAMPLE_CARDS.len(),
            "Seeded initial data"
        );
        Ok(true)
    }
}
