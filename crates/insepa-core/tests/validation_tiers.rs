//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Pure Helpers (checksum, units)
//! - T1: Index Allocation
//! - T2: Block Lifecycle
//! - T3: Registry and Documents
//! - T4: Triggers

use insepa_core::{
    BlockLifecycle, CbStatus, EntradaField, InsepaError, Namespace, NamespaceCursor, Passage,
    SaidaField, Session, Token, UnitTokenizer, checksum, namespaces_from_json, namespaces_to_json,
};

fn tokens(scope: u64, seqs: std::ops::RangeInclusive<u64>) -> Vec<Token> {
    seqs.map(|s| Token::new(scope, s)).collect()
}

// =============================================================================
// TIER T0: PURE HELPERS
// =============================================================================

mod t0_pure_helpers {
    use super::*;

    /// T0.1: Empty text weighs nothing.
    #[test]
    fn empty_checksum_is_zero() {
        assert_eq!(checksum(""), 0);
    }

    /// T0.2: Negated letters reduce totals.
    #[test]
    fn negated_letters() {
        assert_eq!(checksum("J"), -10);
        assert_eq!(checksum("m"), -13);
        assert_eq!(checksum("V"), -22);
        assert_eq!(checksum("y"), -25);
    }

    /// T0.3: Accents fold onto their base letter.
    #[test]
    fn accent_folding() {
        assert_eq!(checksum("É"), checksum("E"));
        assert_eq!(checksum("ação"), checksum("ACAO"));
    }

    /// T0.4: Units are word runs and symbol runs.
    #[test]
    fn units_words_and_symbols() {
        assert_eq!(UnitTokenizer::units("Hello Adam."), vec!["Hello", "Adam", "."]);
        assert_eq!(UnitTokenizer::units("Wait...?!"), vec!["Wait", "...?!"]);
        assert_eq!(UnitTokenizer::count_units("   "), 0);
    }
}

// =============================================================================
// TIER T1: INDEX ALLOCATION
// =============================================================================

mod t1_index_allocation {
    use super::*;

    /// T1.1: The reference "Hello Adam." block.
    #[test]
    fn hello_adam_block() {
        let ns = Namespace::new(0, "Interações");
        let (block, last) =
            BlockLifecycle::open_block(0, &ns, &Passage::new("Hello Adam.", "", "Greeting"));

        assert_eq!(block.id, 1);
        assert_eq!(block.entrada.tokens.text, tokens(0, 1..=3));
        assert!(block.entrada.tokens.reaction.is_empty());
        assert_eq!(block.entrada.tokens.context, vec![Token::new(0, 4)]);
        assert_eq!(block.entrada.end, Some(Token::new(0, 4)));
        assert_eq!(last, 4);
        assert_eq!(block.entrada.checksum, checksum("Hello Adam."));
        assert!(block.open);
    }

    /// T1.5: A symbol run consumes a single index.
    #[test]
    fn symbol_run_consumes_one_index() {
        let mut session = Session::new();
        session
            .save_block(0, &Passage::new("Wait...", "", ""), &["Sim?!".to_string()], "", "")
            .expect("save");

        let block = session.block(0, 1).expect("block");
        assert_eq!(block.entrada.tokens.total, tokens(0, 1..=2));
        assert_eq!(block.saidas[0].tokens.total, tokens(0, 3..=4));
        assert_eq!(session.namespace(0).expect("ns").last_child, "0.4");
    }

    /// T1.2: A second block starts strictly above the first.
    #[test]
    fn second_block_above_first() {
        let mut session = Session::new();
        session
            .save_block(0, &Passage::new("Hello Adam.", "", "Greeting"), &[], "", "")
            .expect("first");
        session
            .save_block(0, &Passage::new("Oi", "", ""), &[], "", "")
            .expect("second");

        let second = session.block(0, 2).expect("second");
        assert_eq!(second.entrada.tokens.total, vec![Token::new(0, 5)]);
        assert_eq!(
            NamespaceCursor::last_index(session.namespace(0).expect("ns")),
            5
        );
    }

    /// T1.3: The advisory marker is ignored when allocating.
    #[test]
    fn advisory_marker_not_trusted() {
        let mut session = Session::new();
        session
            .save_block(0, &Passage::new("a b c", "", ""), &[], "", "")
            .expect("save");

        let json = namespaces_to_json(session.namespaces()).expect("serialize");
        let mut doc: serde_json::Value = serde_json::from_slice(&json).expect("json");
        doc["maes"]["0"]["ultimo_child"] = serde_json::json!("0.1");
        let bytes = serde_json::to_vec(&doc).expect("json");
        let (registry, _) = namespaces_from_json(&bytes).expect("load");

        let mut session = Session::with_documents(registry, Default::default());
        session
            .save_block(0, &Passage::new("d", "", ""), &[], "", "")
            .expect("save");
        assert_eq!(
            session.block(0, 2).expect("b").entrada.tokens.total,
            vec![Token::new(0, 4)]
        );
    }

    /// T1.4: Extending an early block allocates above the later blocks.
    #[test]
    fn extend_uses_whole_namespace_history() {
        let mut session = Session::new();
        for text in ["um", "dois", "três"] {
            session
                .save_block(0, &Passage::new(text, "", ""), &[], "", "")
                .expect("save");
        }
        session
            .extend_block(0, 1, &Passage::new("resposta longa", "r", ""))
            .expect("extend");

        let saida = &session.block(0, 1).expect("b").saidas[0];
        assert_eq!(saida.tokens.text, tokens(0, 4..=5));
        assert_eq!(saida.tokens.reaction, vec![Token::new(0, 6)]);
    }
}

// =============================================================================
// TIER T2: BLOCK LIFECYCLE
// =============================================================================

mod t2_block_lifecycle {
    use super::*;

    fn saved(outputs: &[&str], reaction: &str, context: &str) -> Session {
        let mut session = Session::new();
        let outputs: Vec<String> = outputs.iter().map(|s| (*s).to_string()).collect();
        session
            .save_block(0, &Passage::new("Pergunta?", "", ""), &outputs, reaction, context)
            .expect("save");
        session
    }

    /// T2.1: Same reaction and context merge into one record.
    #[test]
    fn same_kind_merges() {
        let session = saved(&["Um.", "Dois."], "feliz", "");
        let block = session.block(0, 1).expect("block");

        assert_eq!(block.saidas.len(), 1);
        let saida = &block.saidas[0];
        assert_eq!(saida.texts, vec!["Um.", "Dois."]);
        // 2 entrada | Um . feliz | Dois .
        assert_eq!(saida.tokens.text, vec![
            Token::new(0, 3),
            Token::new(0, 4),
            Token::new(0, 6),
            Token::new(0, 7),
        ]);
        assert_eq!(saida.tokens.reaction, vec![Token::new(0, 5)]);
        assert_eq!(saida.end, Some(Token::new(0, 7)));
        assert_eq!(saida.checksum, checksum("Um.") + checksum("Dois."));
    }

    /// T2.2: A different reaction opens a new record.
    #[test]
    fn different_kind_opens_record() {
        let mut session = saved(&["Um."], "feliz", "");
        session
            .extend_block(0, 1, &Passage::new("Dois.", "triste", ""))
            .expect("extend");

        let block = session.block(0, 1).expect("block");
        assert_eq!(block.saidas.len(), 2);
        assert_eq!(block.saidas[1].tokens.reaction, vec![Token::new(0, 8)]);
        assert_eq!(block.saidas[1].tokens.text, tokens(0, 6..=7));
    }

    /// T2.3: Removal renumbers densely from 1.
    #[test]
    fn remove_renumbers() {
        let mut session = Session::new();
        for text in ["a", "b", "c", "d", "e"] {
            session
                .save_block(0, &Passage::new(text, "", ""), &[], "", "")
                .expect("save");
        }

        session.remove_block(0, 2).expect("remove");
        assert_eq!(session.remove_range(0, "2-3").expect("range"), 2);

        let ns = session.namespace(0).expect("ns");
        let texts: Vec<_> = ns.blocks.iter().map(|b| (b.id, b.entrada.text.as_str())).collect();
        assert_eq!(texts, vec![(1, "a"), (2, "e")]);
    }

    /// T2.4: Malformed and out-of-range removals change nothing.
    #[test]
    fn bad_removals_rejected() {
        let mut session = Session::new();
        session
            .save_block(0, &Passage::new("a", "", ""), &[], "", "")
            .expect("save");
        let before = session.namespaces().clone();

        assert!(matches!(
            session.remove_range(0, "3"),
            Err(InsepaError::MalformedRange(_))
        ));
        assert!(matches!(
            session.remove_range(0, "2-1"),
            Err(InsepaError::MalformedRange(_))
        ));
        assert!(matches!(
            session.remove_range(0, "1-4"),
            Err(InsepaError::BlockNotFound { .. })
        ));
        assert!(session.remove_block(0, 0).is_err());
        assert_eq!(session.namespaces(), &before);
    }

    /// T2.5: Field edits keep tokens and refresh checksums.
    #[test]
    fn field_edits() {
        let mut session = saved(&["Um."], "", "");
        let tokens_before = session.block(0, 1).expect("b").entrada.tokens.clone();

        session
            .edit_entrada(0, 1, EntradaField::Text, "Outra pergunta longa?")
            .expect("edit");
        session
            .edit_saida(0, 1, 1, SaidaField::FragmentAt(1), "Zero.")
            .expect("edit");
        session
            .edit_saida(0, 1, 1, SaidaField::Reaction, "calmo")
            .expect("edit");

        let block = session.block(0, 1).expect("b");
        assert_eq!(block.entrada.tokens, tokens_before);
        assert_eq!(block.entrada.checksum, checksum("Outra pergunta longa?"));
        assert_eq!(block.saidas[0].checksum, checksum("Zero."));
        assert_eq!(block.saidas[0].reaction, "calmo");
    }
}

// =============================================================================
// TIER T3: REGISTRY AND DOCUMENTS
// =============================================================================

mod t3_registry_documents {
    use super::*;

    /// T3.1: Removing a namespace shifts later ids down.
    #[test]
    fn remove_shifts_ids() {
        let mut session = Session::new();
        session.add_namespace("Gênesis").expect("add");
        session.add_namespace("Êxodo").expect("add");

        session.remove_namespace(0).expect("remove");
        assert_eq!(session.namespace(0).expect("0").name, "Gênesis");
        assert_eq!(session.namespace(1).expect("1").name, "Êxodo");
        assert!(session.namespace(2).is_err());
    }

    /// T3.2: Save, load, save is byte-identical.
    #[test]
    fn document_roundtrip() {
        let mut session = Session::new();
        session
            .save_block(
                0,
                &Passage::new("Olá", "", "ctx"),
                &["Oi.".to_string()],
                "r",
                "",
            )
            .expect("save");
        session.set_cb(0, CbStatus::Enabled, "1").expect("cb");
        session.add_cbc(0, "1").expect("cbc");

        let first = namespaces_to_json(session.namespaces()).expect("serialize");
        let (registry, report) = namespaces_from_json(&first).expect("load");
        let second = namespaces_to_json(&registry).expect("serialize");

        assert!(report.is_clean());
        assert_eq!(first, second);
    }

    /// T3.3: Legacy v1 documents keep their tokens after upgrade.
    #[test]
    fn legacy_v1_keeps_tokens() {
        let json = r#"{"maes": {"0": {"nome": "Interações", "ultimo_child": 3, "blocos": [
            {"bloco_id": 1,
             "entrada": {"texto": "Oi", "reacao": "", "contexto": "",
                         "tokens": {"E": ["0.1"], "RE": [], "CE": [], "TOTAL": ["0.1"]},
                         "fim": "0.1", "alnulu": 24},
             "saida": {"texto": "Olá", "reacao": "", "contexto": "",
                       "tokens": {"E": ["0.2"], "RE": [], "CE": [], "TOTAL": ["0.2"]},
                       "fim": "0.2", "alnulu": 28}}
        ]}}}"#;
        let (registry, _) = namespaces_from_json(json.as_bytes()).expect("load");

        let mut session = Session::with_documents(registry, Default::default());
        assert_eq!(session.namespace(0).expect("ns").last_child, "0.3");
        assert_eq!(
            session.block(0, 1).expect("b").saidas[0].tokens.text,
            vec![Token::new(0, 2)]
        );

        session
            .save_block(0, &Passage::new("Novo", "", ""), &[], "", "")
            .expect("save");
        assert_eq!(
            session.block(0, 2).expect("b").entrada.tokens.total,
            vec![Token::new(0, 3)]
        );
    }
}

// =============================================================================
// TIER T4: TRIGGERS
// =============================================================================

mod t4_triggers {
    use super::*;

    fn session_with_cb(bids: &str) -> Session {
        let mut session = Session::new();
        session.set_cb(0, CbStatus::Enabled, bids).expect("cb");
        session
    }

    /// T4.1: 3 then 5 fires on the second call only.
    #[test]
    fn fires_once() {
        let mut session = session_with_cb("3, 5");
        assert!(!session.register_trigger(0, 3).expect("3"));
        assert!(session.register_trigger(0, 5).expect("5"));
    }

    /// T4.2: 3, 3, 5 fires after trimming to [3, 5].
    #[test]
    fn duplicate_then_fire() {
        let mut session = session_with_cb("3, 5");
        session.register_trigger(0, 3).expect("3");
        session.register_trigger(0, 3).expect("3");
        assert!(session.register_trigger(0, 5).expect("5"));
        assert_eq!(session.trigger_sequence(0), &[3, 5]);
    }

    /// T4.3: Non-targets never touch the buffer.
    #[test]
    fn non_target_ignored() {
        let mut session = session_with_cb("3, 5");
        session.register_trigger(0, 3).expect("3");
        assert!(!session.register_trigger(0, 7).expect("7"));
        assert_eq!(session.trigger_sequence(0), &[3]);
    }

    /// T4.4: Disabling makes every registration a no-op.
    #[test]
    fn disabled_is_noop() {
        let mut session = Session::new();
        session.set_cb(0, CbStatus::Disabled, "3").expect("cb");
        assert!(!session.register_trigger(0, 3).expect("3"));
        assert!(session.trigger_sequence(0).is_empty());
    }

    /// T4.5: Unknown namespaces are rejected.
    #[test]
    fn unknown_namespace() {
        let mut session = Session::new();
        assert!(matches!(
            session.register_trigger(5, 1),
            Err(InsepaError::NamespaceNotFound(5))
        ));
    }
}
