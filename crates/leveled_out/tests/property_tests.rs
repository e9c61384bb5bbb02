use leveled_out::{Continuity, Flags, InsertCtrl, Level, Target, insert_prefix, splice_code};
use proptest::prelude::*;

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z ]{0,8}", 1..6).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn test_prefix_preserves_content(s in text(), prefix in "[A-Za-z]{1,6}: ") {
        for ctrl in [InsertCtrl::empty(), InsertCtrl::SKIP_FIRST_LINE, InsertCtrl::ALWAYS] {
            let out = insert_prefix(&s, &prefix, ctrl);
            // Removing the prefix from each line gives the input back.
            let stripped: Vec<&str> = out
                .split('\n')
                .map(|line| line.strip_prefix(prefix.as_str()).unwrap_or(line))
                .collect();
            prop_assert_eq!(stripped.join("\n"), s.clone());
            prop_assert_eq!(out.matches('\n').count(), s.matches('\n').count());
        }
    }

    #[test]
    fn test_skip_first_line_leaves_it_alone(s in text(), prefix in "[A-Z]{1,5}: ") {
        let out = insert_prefix(&s, &prefix, InsertCtrl::SKIP_FIRST_LINE);
        let first_in = s.split('\n').next().unwrap_or("");
        let first_out = out.split('\n').next().unwrap_or("");
        prop_assert_eq!(first_in, first_out);
    }

    #[test]
    fn test_blank_prefix_has_same_width(s in text(), prefix in "[A-Za-z]{1,6}: ") {
        let plain = insert_prefix(&s, &prefix, InsertCtrl::empty());
        let blank = insert_prefix(&s, &prefix, InsertCtrl::BLANK);
        prop_assert_eq!(plain.len(), blank.len());
        prop_assert!(blank.chars().filter(|c| !c.is_whitespace()).count()
            <= plain.chars().filter(|c| !c.is_whitespace()).count());
    }

    #[test]
    fn test_splice_code_only_for_meaningful_codes(code in -5i32..300, default in 1i32..200) {
        let spliced = splice_code("Error: ", code, default);
        if code == 0 || code == default {
            prop_assert_eq!(spliced.as_ref(), "Error: ");
        } else {
            prop_assert_eq!(spliced.into_owned(), format!("Error #{}: ", code));
        }
    }

    #[test]
    fn test_continuity_follows_last_byte(writes in prop::collection::vec("[a-z\n]{0,6}", 0..12)) {
        let mut c = Continuity::default();
        let mut expected = true;
        for w in &writes {
            c.record(Target::SCREEN, w.as_bytes());
            if let Some(last) = w.as_bytes().last() {
                expected = *last == b'\n';
            }
        }
        prop_assert_eq!(c.at_line_start(Target::SCREEN), expected);
        prop_assert!(c.at_line_start(Target::LOGFILE));
    }

    #[test]
    fn test_level_names_parse_back(idx in 0usize..8) {
        let level = Level::CONCRETE[idx];
        prop_assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        prop_assert_eq!(level.as_str().to_lowercase().parse::<Level>().unwrap(), level);
    }

    #[test]
    fn test_flag_lists_ignore_unknown_tokens(junk in "[xyz]{1,5}") {
        let list = format!("pid,{},level", junk);
        prop_assert_eq!(Flags::parse_list(&list), Flags::PID | Flags::LEVEL);
    }
}
