// SPDX-FileCopyrightText: 2026 Deskbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic keyword responder, the last entry of the fallback chain.

use async_trait::async_trait;
use deskbot_core::traits::{AiResponder, PluginAdapter};
use deskbot_core::types::{AdapterType, AiResponse, HealthStatus, Prompt};
use deskbot_core::{AiError, DeskbotError};
use tokio_util::sync::CancellationToken;

use crate::classifier::{classify, Intent, Topic};

/// Model name reported for heuristic replies.
pub const HEURISTIC_MODEL: &str = "keyword-heuristic";

const CONFIDENCE: f32 = 0.3;

/// Answers from canned Portuguese replies keyed by intent and topic.
///
/// Never fails and costs nothing, so a chain ending with it cannot be
/// exhausted by provider outages.
#[derive(Debug, Clone, Default)]
pub struct HeuristicResponder;

impl HeuristicResponder {
    pub fn new() -> Self {
        Self
    }

    fn reply_for(intent: Intent) -> &'static str {
        match intent {
            Intent::Greeting => "Olá! Sou o assistente de suporte de TI. Descreva o problema que você está enfrentando.",
            Intent::Thanks => "Por nada! Se precisar de mais alguma coisa, é só escrever.",
            Intent::HumanRequest => "Entendi que você deseja falar com um atendente. Vou encaminhar a sua solicitação para a equipe de suporte.",
            Intent::ProblemReport { topic: Some(topic) } => topic_reply(topic),
            Intent::ProblemReport { topic: None } => "Sinto muito pelo transtorno. Pode descrever o erro com mais detalhes, incluindo a mensagem exibida e quando ele começou?",
            Intent::Unrecognized => "Não tenho certeza se entendi. Pode descrever o seu problema de TI com mais detalhes?",
        }
    }
}

fn topic_reply(topic: Topic) -> &'static str {
    match topic {
        Topic::Vpn => "Para problemas de VPN, verifique sua conexão com a internet, feche o cliente de VPN e conecte novamente. Se o erro persistir, informe a mensagem exibida.",
        Topic::Password => "Para redefinir sua senha, utilize o portal de autoatendimento. Se a conta estiver bloqueada, aguarde 15 minutos antes de tentar novamente.",
        Topic::Printer => "Verifique se a impressora está ligada, conectada à rede e sem papel atolado. Tente remover e adicionar a impressora novamente.",
        Topic::Email => "Tente fechar e abrir o cliente de e-mail e verifique se a sua caixa não está cheia. Você consegue acessar o e-mail pelo navegador?",
        Topic::Network => "Reinicie o seu computador e o roteador, se possível. Outros dispositivos na mesma rede também estão sem conexão?",
        Topic::Hardware => "Verifique os cabos de energia e de conexão do equipamento. Se possível, teste-o em outra tomada ou porta.",
        Topic::Software => "Tente fechar o programa e abri-lo novamente. Se o problema continuar, reinicie o computador e informe a versão do sistema.",
    }
}

#[async_trait]
impl PluginAdapter for HeuristicResponder {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Responder
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AiResponder for HeuristicResponder {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn respond(
        &self,
        prompt: &Prompt,
        cancel: &CancellationToken,
    ) -> Result<AiResponse, AiError> {
        if cancel.is_cancelled() {
            return Err(AiError::Cancelled);
        }
        let intent = classify(prompt.last_user_text().unwrap_or_default());
        Ok(AiResponse {
            provider: "heuristic".to_string(),
            model: HEURISTIC_MODEL.to_string(),
            text: Self::reply_for(intent).to_string(),
            confidence: CONFIDENCE,
            reasoning_summary: Some(format!("keyword intent: {intent:?}")),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
        })
    }
}
