use anyhow::{Context, Result};
use mongodb::{bson::doc, Database};

use crate::models::vocabulary::VocabularyWord;

/// Starter vocabulary used when the collection is empty. Admins can
/// replace or extend it later; rotation order follows `position`.
const STARTER_WORDS: &[(&str, &str, &str)] = &[
    ("curious", "Eager to learn or know something new", "The curious kitten peeked inside every box."),
    ("brave", "Showing courage even when something is scary", "The brave firefighter climbed the tall ladder."),
    ("gentle", "Soft, kind, and careful", "Be gentle when you hold the baby bird."),
    ("sparkle", "To shine with small flashes of light", "The snow began to sparkle in the morning sun."),
    ("journey", "A trip from one place to another", "Their journey across the river took all day."),
    ("whisper", "To speak very softly and quietly", "She leaned over to whisper the secret."),
    ("enormous", "Very, very big", "An enormous elephant drank from the lake."),
    ("delicious", "Tasting really good", "Grandma's soup smelled delicious."),
    ("imagine", "To picture something in your mind", "Imagine a castle made entirely of clouds."),
    ("patient", "Able to wait calmly without complaining", "The patient gardener waited for the seeds to sprout."),
    ("rescue", "To save someone or something from danger", "The lifeguard swam out to rescue the swimmer."),
    ("glimmer", "A faint or wavering light", "A glimmer of moonlight crossed the floor."),
    ("explore", "To travel around a new place to learn about it", "We love to explore the woods behind the school."),
    ("kindness", "The quality of being friendly and caring", "Her kindness made the new student feel welcome."),
    ("marvelous", "Extremely good or wonderful", "The magician put on a marvelous show."),
    ("shelter", "A place that protects from weather or danger", "The hikers found shelter under a rocky ledge."),
    ("twirl", "To spin around quickly", "The dancers twirl across the stage."),
    ("wisdom", "Knowing what is true or right", "The old owl was famous for its wisdom."),
    ("courage", "The ability to face fear or difficulty", "It took courage to sing in front of the class."),
    ("harvest", "Gathering crops when they are ready", "The farmers finished the apple harvest in October."),
];

/// Idempotent startup seed: inserts the starter list only when the
/// vocabulary collection has no documents at all.
pub async fn bootstrap(mongo: &Database) -> Result<()> {
    let collection = mongo.collection::<VocabularyWord>("vocabulary");

    let count = collection
        .estimated_document_count()
        .await
        .context("Failed to count vocabulary documents")?;

    if count > 0 {
        tracing::debug!("Vocabulary collection already seeded ({} words)", count);
        return Ok(());
    }

    let words: Vec<VocabularyWord> = STARTER_WORDS
        .iter()
        .enumerate()
        .map(|(position, (word, definition, example))| VocabularyWord {
            id: None,
            word: (*word).to_string(),
            definition: (*definition).to_string(),
            example: (*example).to_string(),
            position: position as u32,
        })
        .collect();

    let inserted = collection
        .insert_many(&words)
        .await
        .context("Failed to seed vocabulary collection")?;

    tracing::info!(
        "Seeded vocabulary collection with {} starter words",
        inserted.inserted_ids.len()
    );

    Ok(())
}
