use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::service::clock::reference_offset;

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

pub async fn generate_openai_prompt(
    prompt: &str,
    prompt_type: &str,
    api_key: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let now: DateTime<FixedOffset> = Utc::now().with_timezone(&reference_offset());

    let full_prompt = match prompt_type {
        "event_extraction" => format!(
            "Você é um extrator de eventos de agenda.\n\
             Data e hora atuais (America/Sao_Paulo, UTC-3): {now}\n\
             Tarefa: a partir da mensagem do usuário abaixo, extraia os campos do evento.\n\
             Regras:\n\
             - \"title\": título curto do evento, sem palavras de agendamento. \"Reunião com João amanhã às 14:30\" -> \"Reunião com João\".\n\
             - \"start_date\": data no formato YYYY-MM-DD. Resolva termos relativos (\"amanhã\", \"sexta que vem\") a partir da data atual.\n\
             - \"start_time\" e \"end_time\": horários no formato 24h HH:MM, ou null quando não informados.\n\
             - \"duration_minutes\": duração em minutos quando o usuário informar (\"por 2 horas\" -> 120), senão null. Nunca invente duração.\n\
             - \"all_day\": true somente quando o usuário pedir o dia todo.\n\
             - \"participants\": lista de {{\"name\", \"email\", \"resolved\"}}; use \"email\": null e \"resolved\": false quando não souber o e-mail da pessoa.\n\
             - \"description\" e \"location\": null quando ausentes.\n\
             - Se o horário for vago (\"de manhã\", \"no fim do dia\"), NÃO invente: adicione \"horário vago (<trecho>)\" em \"ambiguities\" e use \"status\": \"ambiguous\".\n\
             - Se a data for vaga (\"semana que vem\", \"qualquer dia\"), adicione \"data vaga (<trecho>)\" em \"ambiguities\" e use \"status\": \"ambiguous\".\n\
             - Se a data não existir no calendário (ex: 30/02), adicione \"data inválida: <trecho>\" em \"ambiguities\" e use \"status\": \"ambiguous\".\n\
             - Se a mensagem não descrever um evento, use \"status\": \"error\" e explique o motivo em \"ambiguities\".\n\
             - \"confidence\": número entre 0 e 1.\n\
             - Responda SOMENTE com JSON puro, sem prosa, markdown ou cercas de código.\n\
             - O formato exato:\n\
             {{\"title\":\"<string|null>\",\"start_date\":\"<YYYY-MM-DD|null>\",\"start_time\":\"<HH:MM|null>\",\"end_time\":\"<HH:MM|null>\",\"duration_minutes\":<int|null>,\"all_day\":<bool>,\"participants\":[{{\"name\":\"<string>\",\"email\":\"<string|null>\",\"resolved\":<bool>}}],\"description\":\"<string|null>\",\"location\":\"<string|null>\",\"ambiguities\":[\"<string>\"],\"confidence\":<number>,\"status\":\"success|ambiguous|error\"}}\n\
             Mensagem do usuário: \"{user_prompt}\"",
            now = now.to_rfc3339(),
            user_prompt = prompt
        ),
        _ => return Err("Not a valid base prompt".to_string().into()),
    };

    query_openai(full_prompt, prompt_type, api_key).await
}

async fn query_openai(
    prompt: String,
    prompt_type: &str,
    api_key: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let system_message = match prompt_type {
        "event_extraction" => {
            "Você é um extrator estrito de eventos em JSON. Você lê as instruções e a mensagem do usuário e responde SOMENTE com um único objeto JSON, sem markdown, sem crases e sem texto extra. Quando o usuário dá uma data explícita (ex: \"25/12\"), você preserva exatamente esse dia e mês, completando apenas o que faltar conforme as instruções."
        }
        _ => "You are a helpful assistant.",
    };

    let request: OpenAIRequest = OpenAIRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: system_message.to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt,
            },
        ],
        max_tokens: 1500,
        temperature: 0.2,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
        .build()?;
    let response = client
        .post("https://api.openai.com/v1/chat/completions")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        eprintln!("OpenAI error {}: {}", status, text);
        return Err(format!("Request failed with status {}", status).into());
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse JSON: {}\nRaw body: {}", e, text))?;

    if let Some(choice) = parsed.choices.first() {
        Ok(choice.message.content.clone())
    } else {
        eprintln!("No choices found in response.\nRaw body:\n{}", text);
        Err("No response from OpenAI".to_string().into())
    }
}
