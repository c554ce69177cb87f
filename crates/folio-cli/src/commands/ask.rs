use anyhow::Result;
use console::style;
use folio::bootstrap::build_agent;
use folio::configuration::Settings;

/// Answer one question, or keep prompting until the user types `exit`
pub async fn handle_ask(settings: &Settings, question: Option<String>) -> Result<()> {
    let agent = build_agent(settings)?;

    if let Some(question) = question {
        let answer = agent.answer(&question).await?;
        println!("{}", answer);
        return Ok(());
    }

    cliclack::intro(style(" folio ").on_cyan().black())?;
    cliclack::log::remark(format!(
        "Ask about {} {}",
        settings.owner.name,
        style("- type \"exit\" to end the session").dim()
    ))?;

    loop {
        let question: String = cliclack::input("Question:").interact()?;
        if question.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let spin = cliclack::spinner();
        spin.start("awaiting reply");
        match agent.answer(&question).await {
            Ok(answer) => {
                spin.stop("");
                println!("{}\n", answer);
            }
            Err(e) => {
                spin.error(e.to_string());
            }
        }
    }

    cliclack::outro("Goodbye!")?;
    Ok(())
}
