/// linedex walkthrough
///
/// Indexes a handful of documents into a temporary directory, then runs
/// the query forms the parser understands.

use linedex::{fields, Config, FieldFlags, Schema, SearchEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("linedex-demo");
    let config = Config::default().with_storage_path(&dir);

    let schema = Schema::new("animals")
        .add_field("title", FieldFlags::REQUIRED | FieldFlags::STORED | FieldFlags::INDEXED)?
        .add_field("text", FieldFlags::STORED | FieldFlags::INDEXED | FieldFlags::FULLTEXT)?
        .add_field("description", FieldFlags::STORED)?;

    let mut engine = SearchEngine::open(schema, config)?;
    engine.truncate()?;

    println!("Indexing documents into {}", dir.display());
    engine.add_document(fields([
        ("title", "Cat animal"),
        ("text", "Meow world! This is a search engine."),
        ("description", "this is a description"),
    ]))?;
    engine.add_document(fields([
        ("title", "Dog"),
        ("text", "Bark Bark! Search development is fun for the world."),
        ("description", "Describe the problems"),
    ]))?;
    engine.add_document(fields([
        ("title", "Snake"),
        ("text", "szee szee! This is the minimal search engine for the animal world."),
        ("description", "this is a description"),
    ]))?;
    let written = engine.flush()?;
    println!("Flushed {} documents, {} stored\n", written.len(), engine.count()?);

    let queries = [
        "search engine",
        "search OR engine",
        "(search engine) OR fun",
        "world NOT(engine)",
        "title:dog",
        "anim*",
        "\"the animal world\"",
        "develepment",
    ];

    for query in queries {
        let hits = engine.search(query)?;
        println!("{:<26} -> {} hit(s)", query, hits.len());
        for hit in hits {
            let title = hit
                .document
                .get("title")
                .map(|value| value.as_text().into_owned())
                .unwrap_or_default();
            println!(
                "    #{:<3} {:<12} weight {:>5.1} fulltext {}",
                hit.id, title, hit.weight, hit.fulltext
            );
        }
    }

    Ok(())
}
