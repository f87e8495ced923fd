use enem_genius_core::{
    assemble_context, ingest_text, DocumentStore, MemoryStore, RetrievalOptions,
    SelectionStrategy,
};

const BIOLOGIA: &str = "Fotossíntese\n\nA fotossíntese ocorre nos cloroplastos. A clorofila absorve luz e a fotossíntese libera oxigênio.\n\n- Fase clara: fotólise da água\n- Fase escura: ciclo de Calvin";
const HISTORIA: &str = "Era Vargas\n\nO Estado Novo centralizou o poder. A CLT foi criada em 1943.";
const QUIMICA: &str = "Estequiometria\n\nBalanceamento de equações e cálculo de mols. A fotossíntese também é uma reação química.";

async fn seeded_store(options: &RetrievalOptions) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let store = MemoryStore::new();
    store.init().await?;
    for (name, text) in [("biologia.md", BIOLOGIA), ("historia.txt", HISTORIA), ("quimica.txt", QUIMICA)] {
        store.save(&ingest_text(name, text, options)?).await?;
    }
    Ok(store)
}

#[tokio::test]
async fn selected_documents_feed_ranked_context() -> Result<(), Box<dyn std::error::Error>> {
    let options = RetrievalOptions {
        chunk_max_chars: 120,
        max_context_chars: 400,
        ..RetrievalOptions::default()
    };
    let store = seeded_store(&options).await?;

    let chunks = store.selected_chunks().await?;
    let selection = assemble_context("fotossíntese", &chunks, &options);

    assert_eq!(selection.strategy, SelectionStrategy::Ranked);
    assert!(selection.text.starts_with("Fotossíntese"));
    assert!(selection.text.contains("reação química"));
    assert!(!selection.text.contains("Estado Novo"));
    assert!(selection.text.chars().count() <= options.max_context_chars);
    Ok(())
}

#[tokio::test]
async fn deselected_documents_are_excluded() -> Result<(), Box<dyn std::error::Error>> {
    let options = RetrievalOptions::default();
    let store = seeded_store(&options).await?;

    for meta in store.list_meta().await? {
        if meta.name != "historia.txt" {
            store.set_selected(&meta.id, false).await?;
        }
    }

    let chunks = store.selected_chunks().await?;
    let selection = assemble_context("fotossíntese", &chunks, &options);

    assert_eq!(selection.strategy, SelectionStrategy::Fallback);
    assert!(selection.text.contains("Estado Novo"));
    assert!(!selection.text.contains("cloroplastos"));
    Ok(())
}
