//! The `uniquery quiz` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use uniquery_core::extract::Extractor;
use uniquery_core::model::{ExtractionMode, Question};
use uniquery_core::prompts::{recommendation_prompt, Difficulty, QuestionType, QuizRequest};
use uniquery_core::review::{format_elapsed, SessionReview};
use uniquery_core::session::{export_file_name, AssessmentSession};
use uniquery_providers::{load_config_from, UniqueryConfig};

use super::{generate, read_input};

pub struct QuizArgs {
    pub topic: Option<String>,
    pub count: usize,
    pub difficulty: Difficulty,
    pub types: Option<String>,
    pub questions: Option<PathBuf>,
    pub answers: Option<String>,
    pub export: Option<PathBuf>,
    pub recommend: bool,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: QuizArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let (questions, label) = match &args.questions {
        Some(path) => {
            let raw = read_input(path)?;
            let label = args.topic.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Quiz".to_string())
            });
            (extract_strict(&raw)?, label)
        }
        None => {
            let topic = args
                .topic
                .clone()
                .context("--topic is required unless --questions is given")?;
            let request = quiz_request(&topic, &args)?;
            let provider = config.provider(args.provider.as_deref())?;
            let raw = generate(&config, provider.as_ref(), args.model.as_deref(), request.prompt()).await?;
            (extract_strict(&raw)?, topic.trim().to_string())
        }
    };

    let mut session = AssessmentSession::new();
    session.start(questions, label)?;

    match &args.answers {
        Some(spec) => apply_answers(&mut session, spec)?,
        None => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            prompt_answers(&mut session, &mut stdin.lock(), &mut stdout.lock())?;
        }
    }

    session.submit()?;
    let review = session.review()?;
    print_review(&review);

    if args.recommend {
        recommend(&config, &session, &args).await;
    }

    if let Some(target) = &args.export {
        let path = if target.is_dir() {
            target.join(export_file_name(chrono::Utc::now()))
        } else {
            target.clone()
        };
        session.snapshot().save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn quiz_request(topic: &str, args: &QuizArgs) -> Result<QuizRequest> {
    let mut request = QuizRequest::new(topic);
    request.count = args.count;
    request.difficulty = args.difficulty;
    if let Some(types) = &args.types {
        request.question_types = types
            .split(',')
            .map(|t| t.trim().parse::<QuestionType>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    request.validate().map_err(|e| anyhow::anyhow!(e))?;
    Ok(request)
}

fn extract_strict(raw: &str) -> Result<Vec<Question>> {
    Extractor::new(ExtractionMode::Strict).extract(raw).map_err(|e| {
        tracing::debug!(raw = %e.raw_text().unwrap_or(raw), "rejected model output");
        anyhow::Error::new(e).context("the model's quiz could not be used")
    })
}

/// Parse `"0=Paris,1=4"` into `(index, value)` pairs.
///
/// A comma only starts a new pair when it is followed by `<index>=`, so
/// option text may itself contain commas.
fn parse_answers(spec: &str) -> Result<Vec<(usize, String)>> {
    let mut pairs: Vec<(usize, String)> = Vec::new();
    for segment in spec.split(',') {
        match split_pair(segment) {
            Some((index, value)) => pairs.push((index, value.to_string())),
            None => match pairs.last_mut() {
                Some((_, value)) => {
                    value.push(',');
                    value.push_str(segment);
                }
                None if segment.trim().is_empty() => {}
                None => anyhow::bail!("invalid answer '{segment}', expected INDEX=OPTION"),
            },
        }
    }
    Ok(pairs
        .into_iter()
        .map(|(index, value)| (index, value.trim().to_string()))
        .collect())
}

fn split_pair(segment: &str) -> Option<(usize, &str)> {
    let (index, value) = segment.split_once('=')?;
    let index = index.trim().parse().ok()?;
    Some((index, value))
}

/// Option text for `value`: exact option text first, then a 1-based option number.
fn resolve_option<'q>(question: &'q Question, value: &str) -> Option<&'q str> {
    let value = value.trim();
    if let Some(option) = question.options().iter().find(|o| o.as_str() == value) {
        return Some(option);
    }
    let n: usize = value.parse().ok()?;
    question
        .options()
        .get(n.checked_sub(1)?)
        .map(String::as_str)
}

fn apply_answers(session: &mut AssessmentSession, spec: &str) -> Result<()> {
    for (index, value) in parse_answers(spec)? {
        let question = session
            .questions()
            .get(index)
            .with_context(|| format!("question {index} does not exist"))?;
        let option = resolve_option(question, &value)
            .with_context(|| format!("question {index} has no option '{value}'"))?
            .to_string();
        session.select_answer(index, &option)?;
    }
    Ok(())
}

/// Ask every question in turn. A blank line skips; end of input skips the rest.
fn prompt_answers(
    session: &mut AssessmentSession,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<()> {
    let total = session.questions().len();
    loop {
        let index = session.current_index();
        let Some(question) = session.current_question() else {
            break;
        };

        writeln!(out, "\nQuestion {} of {total}: {}", index + 1, question.text())?;
        for (i, option) in question.options().iter().enumerate() {
            writeln!(out, "  {}. {option}", i + 1)?;
        }

        let choice = loop {
            write!(out, "Your answer (1-{}, blank to skip): ", question.options().len())?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let line = line.trim();
            if line.is_empty() {
                break None;
            }
            match resolve_option(question, line) {
                Some(option) => break Some(option.to_string()),
                None => writeln!(out, "Not an option: {line}")?,
            }
        };

        if let Some(option) = choice {
            session.select_answer(index, &option)?;
        }
        if !session.next() {
            break;
        }
    }
    Ok(())
}

fn print_review(review: &SessionReview<'_>) {
    println!("\nQuiz: {}", review.topic);
    println!(
        "Score: {}/{} ({:.2}%)",
        review.score, review.total, review.percentage
    );
    println!("Time: {}", format_elapsed(review.elapsed_seconds));
    println!("{}", review.band.message());

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Your answer", "Correct answer", "Result"]);
    for entry in &review.entries {
        table.add_row(vec![
            Cell::new(entry.index + 1),
            Cell::new(entry.question.text()),
            Cell::new(entry.given.unwrap_or("(no answer)")),
            Cell::new(entry.correct_answer()),
            Cell::new(if entry.is_correct { "OK" } else { "WRONG" }),
        ]);
    }
    println!("\n{table}");

    for entry in review.entries.iter().filter(|e| !e.is_correct) {
        println!("\nQ{}: {}", entry.index + 1, entry.explanation());
    }
}

async fn recommend(config: &UniqueryConfig, session: &AssessmentSession, args: &QuizArgs) {
    let (Ok(wrong), Some(percentage)) = (session.wrong_answers(), session.percentage()) else {
        return;
    };
    if wrong.is_empty() {
        println!("\nNo recommendations needed: every answer was correct.");
        return;
    }

    let prompt = recommendation_prompt(percentage, session.topic_label(), &wrong);
    let result = match config.provider(args.provider.as_deref()) {
        Ok(provider) => generate(config, provider.as_ref(), args.model.as_deref(), prompt).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(text) => println!("\nStudy recommendations:\n{text}"),
        Err(e) => eprintln!("Could not generate recommendations: {e:#}"),
    }
}
