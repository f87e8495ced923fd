use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Terms at or below this length carry no retrieval signal.
pub const MIN_TERM_LEN: usize = 2;

const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "de", "a", "o", "que", "e", "do", "da", "em", "um", "para", "é", "com", "não", "uma",
    "os", "no", "na", "por", "mais", "as", "dos", "como", "mas", "foi", "ao", "ele", "das",
    "tem", "à", "seu", "sua", "ou", "ser", "quando", "muito", "há", "nos", "já", "está",
    "eu", "também", "só", "pelo", "pela", "até", "isso", "ela", "entre", "era", "depois",
    "sem", "mesmo", "aos", "ter", "seus", "quem", "nas", "me", "esse", "eles", "estão",
    "você", "tinha", "foram", "essa", "num", "nem", "suas", "meu", "às", "minha", "têm",
    "numa", "pelos", "elas", "havia", "seja", "qual", "será", "nós", "tenho", "lhe",
    "deles", "essas", "esses", "pelas", "este", "fosse", "dele", "tu", "te", "vocês", "vos",
    "lhes", "meus", "minhas", "teu", "tua", "teus", "tuas", "nosso", "nossa", "nossos",
    "nossas", "dela", "delas", "esta", "estes", "estas", "aquele", "aquela", "aqueles",
    "aquelas", "isto", "aquilo", "estou", "estamos", "estive", "esteve", "estivemos",
    "estiveram", "estava", "estávamos", "estavam", "estivera", "estivéramos", "esteja",
    "estejamos", "estejam", "estivesse", "estivéssemos", "estivessem", "estiver",
    "estivermos", "estiverem", "hei", "havemos", "hão", "houve", "houvemos", "houveram",
    "houvera", "houvéramos", "haja", "hajamos", "hajam", "houvesse", "houvéssemos",
    "houvessem", "houver", "houvermos", "houverem", "houverei", "houverá", "houveremos",
    "houverão", "houveria", "houveríamos", "houveriam", "sou", "somos", "são", "éramos",
    "eram", "fui", "fomos", "fora", "fôramos", "sejamos", "sejam", "fôssemos", "fossem",
    "for", "formos", "forem", "serei", "seremos", "serão", "seria", "seríamos", "seriam",
    "temos", "tém", "tínhamos", "tinham", "tive", "teve", "tivemos", "tiveram", "tivera",
    "tivéramos", "tenha", "tenhamos", "tenham", "tivesse", "tivéssemos", "tivessem",
    "tiver", "tivermos", "tiverem", "terei", "terá", "teremos", "terão", "teria",
    "teríamos", "teriam",
];

/// Stop-words in their normalized (accent-free) form, so they are compared
/// against tokens after the same folding.
fn stop_words() -> &'static HashSet<String> {
    static STOP_WORDS: OnceLock<HashSet<String>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| {
        PORTUGUESE_STOP_WORDS
            .iter()
            .map(|word| fold(word))
            .collect()
    })
}

pub fn is_stop_word(term: &str) -> bool {
    stop_words().contains(&fold(term))
}

/// Lower-case, strip diacritics and drop everything but word characters and
/// whitespace.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Splits `text` into content-bearing terms, left to right, duplicates kept.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let stop = stop_words();
    fold(text)
        .split_whitespace()
        .filter(|token| token.len() > MIN_TERM_LEN)
        .filter(|token| !stop.contains(*token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_terms() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t ").is_empty());
    }

    #[test]
    fn accents_and_case_fold_identically() {
        assert_eq!(tokenize("café"), tokenize("CAFE"));
        assert_eq!(tokenize("Educação Física"), vec!["educacao", "fisica"]);
    }

    #[test]
    fn punctuation_is_stripped_before_splitting() {
        assert_eq!(tokenize("fotossíntese, clorofila!"), vec!["fotossintese", "clorofila"]);
        assert_eq!(tokenize("água-viva"), vec!["aguaviva"]);
    }

    #[test]
    fn short_tokens_and_stop_words_are_dropped() {
        let terms = tokenize("O gato e o cachorro são de uma casa com eles");
        assert_eq!(terms, vec!["gato", "cachorro", "casa"]);
    }

    #[test]
    fn accented_stop_words_match_after_folding() {
        assert!(is_stop_word("estão"));
        assert!(is_stop_word("ESTAO"));
        assert!(tokenize("não também estávamos").is_empty());
    }

    #[test]
    fn order_and_duplicates_are_preserved() {
        assert_eq!(
            tokenize("revolução industrial, revolução francesa"),
            vec!["revolucao", "industrial", "revolucao", "francesa"]
        );
    }

    #[test]
    fn output_never_contains_filtered_tokens() {
        let samples = [
            "Há muito tempo, os povos originários já viviam aqui.",
            "É preciso que você esteja atento às questões do ENEM 2024!",
            "a b c dd eee ffff",
        ];
        for sample in samples {
            for term in tokenize(sample) {
                assert!(term.len() > MIN_TERM_LEN, "{term} too short");
                assert!(!is_stop_word(&term), "{term} is a stop-word");
            }
        }
    }

    #[test]
    fn tokenize_is_deterministic() {
        let text = "Geografia urbana e migração no Brasil";
        assert_eq!(tokenize(text), tokenize(text));
    }
}
