use super::ParseError;
use super::fields;
use super::tokenizer::{ArgumentTokens, tokenize};
use crate::command::{Command, EditDelta, FilterSpec};
use crate::index::MultiIndex;
use crate::model::person::Person;
use crate::model::timeslot::Timeslot;

pub const ADD_USAGE: &str = "Usage: add i/STUDENTID n/NAME p/PHONE e/EMAIL g/GITHUB [t/TAG]...";
pub const DELETE_USAGE: &str = "Usage: delete INDEX  (INDEX is N or N:M)";
pub const EDIT_USAGE: &str =
    "Usage: edit INDEX [i/STUDENTID] [n/NAME] [p/PHONE] [e/EMAIL] [g/GITHUB] [t/TAG]...";
pub const GRADE_USAGE: &str = "Usage: grade INDEX en/EXAMNAME s/(y|n)";
pub const MARKE_USAGE: &str = "Usage: marke INDEX ei/EXERCISEINDEX s/(y|n)";
pub const ATT_USAGE: &str = "Usage: att INDEX s/(y|n)";
pub const BLOCK_USAGE: &str = "Usage: block-timeslot ts/START te/END";
pub const UNBLOCK_USAGE: &str = "Usage: unblock-timeslot ts/START te/END";
pub const CONSULT_USAGE: &str = "Usage: add-consultation ts/START te/END n/STUDENTNAME";
pub const SET_WEEK_USAGE: &str = "Usage: set-week WEEKNUMBER  (0-13)";
pub const SORT_USAGE: &str = "Usage: sort c/CRITERION  (name, id, github)";
pub const FILTER_USAGE: &str =
    "Usage: filter [i/KEYWORD]... [n/KEYWORD]... [p/KEYWORD]... [e/KEYWORD]... [g/KEYWORD]... [t/KEYWORD]... [a/EXPRESSION]";

/// Routes a command word to its parser. The argument string arrives untrimmed
/// on the left so the tokenizer's whitespace rule applies to the first prefix.
pub fn parse(word: &str, args: &str) -> Result<Command, ParseError> {
    match word {
        "add" => parse_add(args),
        "list" => bare(args, "list", Command::List),
        "delete" => parse_delete(args),
        "edit" => parse_edit(args),
        "grade" => parse_grade(args),
        "marke" => parse_mark_exercise(args),
        "att" => parse_attendance(args),
        "filter" => parse_filter(args),
        "sort" => parse_sort(args),
        "block-timeslot" => parse_block_timeslot(args),
        "unblock-timeslot" => parse_unblock_timeslot(args),
        "add-consultation" => parse_add_consultation(args),
        "get-timeslots" => bare(args, "get-timeslots", Command::GetTimeslots),
        "get-consultations" => bare(args, "get-consultations", Command::GetConsultations),
        "clear-timeslots" => bare(args, "clear-timeslots", Command::ClearTimeslots),
        "set-week" => parse_set_week(args),
        "undo" => bare(args, "undo", Command::Undo),
        _ => Err(ParseError::new(format!("Unknown command: '{word}'"))),
    }
}

fn bare(args: &str, word: &str, command: Command) -> Result<Command, ParseError> {
    if args.trim().is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(format!("{word} takes no arguments.")))
    }
}

/// A required single-valued prefix: present and non-empty.
fn require<'a>(
    tokens: &'a ArgumentTokens,
    prefix: &str,
    usage: &str,
) -> Result<&'a str, ParseError> {
    match tokens.value(prefix) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ParseError::new(format!("Missing required field {prefix}")).usage(usage)),
    }
}

fn reject_preamble(tokens: &ArgumentTokens, usage: &str) -> Result<(), ParseError> {
    if tokens.preamble().is_empty() {
        Ok(())
    } else {
        Err(ParseError::new(format!(
            "Unexpected text before the first field: '{}'",
            tokens.preamble()
        ))
        .usage(usage))
    }
}

/// The addressed students, re-contextualizing index failures.
fn parse_targets(raw: &str, usage: &str) -> Result<MultiIndex, ParseError> {
    fields::parse_multi_index(raw)
        .map_err(|error| ParseError::new(format!("Student index: {error}")).usage(usage))
}

fn parse_add(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["i/", "n/", "p/", "e/", "g/", "t/"]);
    reject_preamble(&tokens, ADD_USAGE)?;
    tokens
        .verify_no_duplicates(&["i/", "n/", "p/", "e/", "g/"])
        .map_err(|error| error.usage(ADD_USAGE))?;
    let student_id = fields::parse_student_id(require(&tokens, "i/", ADD_USAGE)?)
        .map_err(|error| error.usage(ADD_USAGE))?;
    let name = fields::parse_name(require(&tokens, "n/", ADD_USAGE)?)
        .map_err(|error| error.usage(ADD_USAGE))?;
    let phone = fields::parse_phone(require(&tokens, "p/", ADD_USAGE)?)
        .map_err(|error| error.usage(ADD_USAGE))?;
    let email = fields::parse_email(require(&tokens, "e/", ADD_USAGE)?)
        .map_err(|error| error.usage(ADD_USAGE))?;
    let github = fields::parse_github(require(&tokens, "g/", ADD_USAGE)?)
        .map_err(|error| error.usage(ADD_USAGE))?;
    let tags = tokens
        .all_values("t/")
        .iter()
        .map(|raw| fields::parse_tag(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.usage(ADD_USAGE))?;
    Ok(Command::Add(Person::new(
        student_id, name, phone, email, github, tags,
    )))
}

fn parse_delete(args: &str) -> Result<Command, ParseError> {
    let targets = parse_targets(args, DELETE_USAGE)?;
    Ok(Command::Delete { targets })
}

fn parse_edit(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["i/", "n/", "p/", "e/", "g/", "t/"]);
    let targets = parse_targets(tokens.preamble(), EDIT_USAGE)?;
    tokens
        .verify_no_duplicates(&["i/", "n/", "p/", "e/", "g/"])
        .map_err(|error| error.usage(EDIT_USAGE))?;
    let delta = EditDelta {
        student_id: parse_optional(&tokens, "i/", fields::parse_student_id, EDIT_USAGE)?,
        name: parse_optional(&tokens, "n/", fields::parse_name, EDIT_USAGE)?,
        phone: parse_optional(&tokens, "p/", fields::parse_phone, EDIT_USAGE)?,
        email: parse_optional(&tokens, "e/", fields::parse_email, EDIT_USAGE)?,
        github: parse_optional(&tokens, "g/", fields::parse_github, EDIT_USAGE)?,
        tags: parse_edit_tags(&tokens)?,
    };
    if delta.is_empty() {
        return Err(ParseError::new("At least one field to edit must be provided.")
            .usage(EDIT_USAGE));
    }
    Ok(Command::Edit { targets, delta })
}

fn parse_optional<T>(
    tokens: &ArgumentTokens,
    prefix: &str,
    parse: impl Fn(&str) -> Result<T, ParseError>,
    usage: &str,
) -> Result<Option<T>, ParseError> {
    tokens
        .value(prefix)
        .map(|raw| parse(raw).map_err(|error| error.usage(usage)))
        .transpose()
}

/// A single bare `t/` clears all tags; otherwise every tag must be valid.
fn parse_edit_tags(tokens: &ArgumentTokens) -> Result<Option<Vec<String>>, ParseError> {
    let raw_tags = tokens.all_values("t/");
    if raw_tags.is_empty() {
        return Ok(None);
    }
    if raw_tags.len() == 1 && raw_tags[0].is_empty() {
        return Ok(Some(Vec::new()));
    }
    let tags = raw_tags
        .iter()
        .map(|raw| fields::parse_tag(raw))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| error.usage(EDIT_USAGE))?;
    Ok(Some(tags))
}

fn parse_grade(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["en/", "s/"]);
    let targets = parse_targets(tokens.preamble(), GRADE_USAGE)?;
    tokens
        .verify_no_duplicates(&["en/", "s/"])
        .map_err(|error| error.usage(GRADE_USAGE))?;
    let exam = fields::parse_exam(require(&tokens, "en/", GRADE_USAGE)?)
        .map_err(|error| error.usage(GRADE_USAGE))?;
    let passed = fields::parse_status(require(&tokens, "s/", GRADE_USAGE)?)
        .map_err(|error| error.usage(GRADE_USAGE))?;
    Ok(Command::Grade {
        targets,
        exam,
        passed,
    })
}

fn parse_mark_exercise(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["ei/", "s/"]);
    let targets = parse_targets(tokens.preamble(), MARKE_USAGE)?;
    tokens
        .verify_no_duplicates(&["ei/", "s/"])
        .map_err(|error| error.usage(MARKE_USAGE))?;
    let exercise = fields::parse_index(require(&tokens, "ei/", MARKE_USAGE)?)
        .map_err(|error| ParseError::new(format!("Exercise index: {error}")).usage(MARKE_USAGE))?;
    let done = fields::parse_status(require(&tokens, "s/", MARKE_USAGE)?)
        .map_err(|error| error.usage(MARKE_USAGE))?;
    Ok(Command::MarkExercise {
        targets,
        exercise,
        done,
    })
}

fn parse_attendance(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["s/"]);
    let targets = parse_targets(tokens.preamble(), ATT_USAGE)?;
    tokens
        .verify_no_duplicates(&["s/"])
        .map_err(|error| error.usage(ATT_USAGE))?;
    let present = fields::parse_status(require(&tokens, "s/", ATT_USAGE)?)
        .map_err(|error| error.usage(ATT_USAGE))?;
    Ok(Command::Attendance { targets, present })
}

fn parse_filter(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["i/", "n/", "p/", "e/", "g/", "t/", "a/"]);
    reject_preamble(&tokens, FILTER_USAGE)?;
    tokens
        .verify_no_duplicates(&["a/"])
        .map_err(|error| error.usage(FILTER_USAGE))?;
    let spec = FilterSpec {
        ids: keyword_list(&tokens, "i/")?,
        names: keyword_list(&tokens, "n/")?,
        phones: keyword_list(&tokens, "p/")?,
        emails: keyword_list(&tokens, "e/")?,
        githubs: keyword_list(&tokens, "g/")?,
        tags: keyword_list(&tokens, "t/")?,
        attendance: tokens
            .value("a/")
            .map(|raw| fields::parse_comparison(raw, false))
            .transpose()
            .map_err(|error| error.usage(FILTER_USAGE))?,
    };
    if spec.is_empty() {
        return Err(
            ParseError::new("Provide at least one filter criterion.").usage(FILTER_USAGE)
        );
    }
    Ok(Command::Filter(spec))
}

fn keyword_list(tokens: &ArgumentTokens, prefix: &str) -> Result<Vec<String>, ParseError> {
    let keywords = tokens.all_values(prefix);
    if keywords.iter().any(|keyword| keyword.is_empty()) {
        return Err(
            ParseError::new(format!("Filter keywords for {prefix} cannot be empty."))
                .usage(FILTER_USAGE),
        );
    }
    Ok(keywords.to_vec())
}

fn parse_sort(args: &str) -> Result<Command, ParseError> {
    let tokens = tokenize(args, &["c/"]);
    reject_preamble(&tokens, SORT_USAGE)?;
    tokens
        .verify_no_duplicates(&["c/"])
        .map_err(|error| error.usage(SORT_USAGE))?;
    let key = fields::parse_sort_key(require(&tokens, "c/", SORT_USAGE)?)
        .map_err(|error| error.usage(SORT_USAGE))?;
    Ok(Command::Sort(key))
}

/// Shared shape of the three timeslot-period commands: ts/ and te/, both
/// required, end strictly after start.
fn parse_period(
    args: &str,
    extra_prefixes: &[&str],
    usage: &str,
) -> Result<(ArgumentTokens, chrono::NaiveDateTime, chrono::NaiveDateTime), ParseError> {
    let mut prefixes = vec!["ts/", "te/"];
    prefixes.extend_from_slice(extra_prefixes);
    let tokens = tokenize(args, &prefixes);
    reject_preamble(&tokens, usage)?;
    tokens
        .verify_no_duplicates(&prefixes)
        .map_err(|error| error.usage(usage))?;
    let start = fields::parse_date_time(require(&tokens, "ts/", usage)?)
        .map_err(|error| error.usage(usage))?;
    let end = fields::parse_date_time(require(&tokens, "te/", usage)?)
        .map_err(|error| error.usage(usage))?;
    if end <= start {
        return Err(ParseError::new("Timeslot end must be strictly after its start.").usage(usage));
    }
    Ok((tokens, start, end))
}

fn parse_block_timeslot(args: &str) -> Result<Command, ParseError> {
    let (_, start, end) = parse_period(args, &[], BLOCK_USAGE)?;
    let slot = Timeslot::block(start, end)
        .map_err(|error| ParseError::new(error.to_string()).usage(BLOCK_USAGE))?;
    Ok(Command::BlockTimeslot(slot))
}

fn parse_unblock_timeslot(args: &str) -> Result<Command, ParseError> {
    let (_, start, end) = parse_period(args, &[], UNBLOCK_USAGE)?;
    Ok(Command::UnblockTimeslot { start, end })
}

fn parse_add_consultation(args: &str) -> Result<Command, ParseError> {
    let (tokens, start, end) = parse_period(args, &["n/"], CONSULT_USAGE)?;
    let student = fields::parse_name(require(&tokens, "n/", CONSULT_USAGE)?)
        .map_err(|error| error.usage(CONSULT_USAGE))?;
    let slot = Timeslot::consultation(start, end, student)
        .map_err(|error| ParseError::new(error.to_string()).usage(CONSULT_USAGE))?;
    Ok(Command::AddConsultation(slot))
}

fn parse_set_week(args: &str) -> Result<Command, ParseError> {
    let week = fields::parse_week(args).map_err(|error| error.usage(SET_WEEK_USAGE))?;
    Ok(Command::SetWeek(week))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SortKey;
    use crate::parser::parse_command;

    #[test]
    fn test_parse_add_full() {
        let command = parse_command(
            "add i/A0217529M n/Alice Pauline p/94351253 e/alice@u.nus.edu g/alice-p t/strong t/quiet",
        )
        .unwrap();
        match command {
            Command::Add(person) => {
                assert_eq!(person.student_id, "A0217529M");
                assert_eq!(person.name, "Alice Pauline");
                assert_eq!(person.tags, ["strong", "quiet"]);
            }
            other => panic!("expected Add, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_missing_required_field_shows_usage() {
        let err = parse_command("add n/Alice p/123 e/a@b g/alice").unwrap_err();
        assert!(err.to_string().contains("i/"));
        assert!(err.to_string().contains("Usage: add"));
    }

    #[test]
    fn test_parse_add_duplicate_single_valued_prefix_rejected() {
        let err = parse_command(
            "add i/A0217529M n/Alice n/Bob p/94351253 e/a@b.c g/alice",
        )
        .unwrap_err();
        assert!(err.to_string().contains("n/"));
        assert!(err.to_string().contains("single-valued"));
    }

    #[test]
    fn test_parse_add_rejects_preamble() {
        let err =
            parse_command("add 1 i/A0217529M n/Alice p/94351253 e/a@b.c g/alice").unwrap_err();
        assert!(err.to_string().contains("Unexpected text"));
    }

    #[test]
    fn test_parse_delete_single_and_range() {
        assert!(matches!(
            parse_command("delete 3").unwrap(),
            Command::Delete { targets } if targets.is_single()
        ));
        assert!(matches!(
            parse_command("delete 2:5").unwrap(),
            Command::Delete { targets } if targets.len() == 4
        ));
    }

    #[test]
    fn test_parse_delete_bad_index_prefixed_with_student() {
        let err = parse_command("delete zero").unwrap_err();
        assert!(err.to_string().starts_with("Student index:"));
        assert!(err.to_string().contains("Usage: delete"));
    }

    #[test]
    fn test_parse_edit_requires_some_field() {
        let err = parse_command("edit 1").unwrap_err();
        assert!(err.to_string().contains("At least one field"));
    }

    #[test]
    fn test_parse_edit_requires_index_preamble() {
        let err = parse_command("edit n/Alice").unwrap_err();
        assert!(err.to_string().starts_with("Student index:"));
    }

    #[test]
    fn test_parse_edit_partial_delta() {
        let command = parse_command("edit 2:3 p/99990000 t/").unwrap();
        match command {
            Command::Edit { targets, delta } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(delta.phone.as_deref(), Some("99990000"));
                assert_eq!(delta.tags, Some(vec![])); // bare t/ clears tags
                assert!(delta.name.is_none());
            }
            other => panic!("expected Edit, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_grade() {
        let command = parse_command("grade 1:3 en/Midterm s/y").unwrap();
        match command {
            Command::Grade {
                targets,
                exam,
                passed,
            } => {
                assert_eq!(targets.len(), 3);
                assert_eq!(exam, "midterm");
                assert!(passed);
            }
            other => panic!("expected Grade, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_grade_bad_exam_shows_valid_set() {
        let err = parse_command("grade 1 en/retest s/y").unwrap_err();
        assert!(err.to_string().contains("midterm"));
        assert!(err.to_string().contains("Usage: grade"));
    }

    #[test]
    fn test_parse_marke() {
        let command = parse_command("marke 2 ei/4 s/n").unwrap();
        match command {
            Command::MarkExercise {
                exercise, done, ..
            } => {
                assert_eq!(exercise.one_based(), 4);
                assert!(!done);
            }
            other => panic!("expected MarkExercise, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_marke_bad_exercise_prefixed() {
        let err = parse_command("marke 1 ei/zero s/y").unwrap_err();
        assert!(err.to_string().contains("Exercise index:"));
    }

    #[test]
    fn test_parse_att() {
        assert!(matches!(
            parse_command("att 1:5 s/y").unwrap(),
            Command::Attendance { present: true, .. }
        ));
    }

    #[test]
    fn test_parse_block_timeslot_iso_and_human() {
        let iso = parse_command("block-timeslot ts/2024-03-04T10:00 te/2024-03-04T11:00").unwrap();
        let human =
            parse_command("block-timeslot ts/4 Mar 2024, 10:00 te/4 Mar 2024, 11:00").unwrap();
        assert_eq!(iso, human);
    }

    #[test]
    fn test_parse_block_timeslot_rejects_inverted_period() {
        let err =
            parse_command("block-timeslot ts/2024-03-04T11:00 te/2024-03-04T10:00").unwrap_err();
        assert!(err.to_string().contains("strictly after"));
    }

    #[test]
    fn test_parse_block_timeslot_missing_end_shows_usage() {
        let err = parse_command("block-timeslot ts/2024-03-04T10:00").unwrap_err();
        assert!(err.to_string().contains("te/"));
        assert!(err.to_string().contains("Usage: block-timeslot"));
    }

    #[test]
    fn test_parse_add_consultation() {
        let command = parse_command(
            "add-consultation ts/2024-03-04T10:00 te/2024-03-04T11:00 n/Alice Pauline",
        )
        .unwrap();
        match command {
            Command::AddConsultation(slot) => {
                assert_eq!(slot.student(), Some("Alice Pauline"));
            }
            other => panic!("expected AddConsultation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_bare_commands_reject_arguments() {
        assert!(parse_command("get-timeslots").is_ok());
        assert!(parse_command("get-timeslots now").is_err());
        assert!(parse_command("get-consultations").is_ok());
        assert!(parse_command("clear-timeslots").is_ok());
        assert!(parse_command("undo").is_ok());
        assert!(parse_command("undo 2").is_err());
    }

    #[test]
    fn test_parse_set_week() {
        assert_eq!(parse_command("set-week 5").unwrap(), Command::SetWeek(5));
        assert!(parse_command("set-week 14").is_err());
        assert!(parse_command("set-week").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_command("sort c/name").unwrap(),
            Command::Sort(SortKey::Name)
        );
        assert!(parse_command("sort c/phone").is_err());
        assert!(parse_command("sort").is_err());
    }

    #[test]
    fn test_parse_filter_keywords_and_attendance() {
        let command = parse_command("filter n/alice t/strong a/>=75").unwrap();
        match command {
            Command::Filter(spec) => {
                assert_eq!(spec.names, ["alice"]);
                assert_eq!(spec.tags, ["strong"]);
                assert!(spec.attendance.is_some());
            }
            other => panic!("expected Filter, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_requires_a_criterion() {
        let err = parse_command("filter").unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_parse_filter_rejects_empty_keyword() {
        let err = parse_command("filter n/").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_parse_grade_prefix_inside_en_not_misread() {
        // en/ must not register as n/, and s/ values stay intact.
        let command = parse_command("grade 1 en/final s/n").unwrap();
        assert!(matches!(
            command,
            Command::Grade { passed: false, .. }
        ));
    }
}
