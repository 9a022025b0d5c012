//! Run one generation against the live endpoint and print the document.

use clap::Parser;
use course_server::{
    course::{CourseRequest, Proficiency},
    generator::{GenerateCourse, LlmGateway},
    utils::init_log,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Course topic
    topic: String,
    /// Additional focus areas
    #[arg(short = 'D', long, default_value = "")]
    description: String,
    /// beginner, intermediate or advanced
    #[arg(short = 'P', long, default_value = "beginner")]
    proficiency: String,
    /// Learning depth, 0-100
    #[arg(short, long, default_value = "50")]
    depth: u8,
    /// Number of chapters, 3-12
    #[arg(short, long, default_value = "6")]
    chapters: u8,
    /// Skip assessment questions
    #[arg(long)]
    no_assessments: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _guard = init_log(None);
    let args = Args::parse();

    let proficiency = match args.proficiency.as_str() {
        "beginner" => Proficiency::Beginner,
        "intermediate" => Proficiency::Intermediate,
        "advanced" => Proficiency::Advanced,
        other => anyhow::bail!("unknown proficiency level: {other}"),
    };
    let request = CourseRequest {
        topic: args.topic,
        description: args.description,
        proficiency,
        depth: args.depth,
        chapters_count: args.chapters,
        include_assessments: !args.no_assessments,
    };
    request.validate().map_err(|e| anyhow::anyhow!(e))?;

    let gateway = LlmGateway::from_env()?;
    let course = gateway.generate(&request).await?;
    println!("{}", serde_json::to_string_pretty(&course)?);

    Ok(())
}
