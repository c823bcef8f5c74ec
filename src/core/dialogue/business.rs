//! Structured intake persona: name, then issue, then acknowledgements.

use rand::RngCore;

use super::{DialogueScript, Persona, contains_any, pick};

pub(crate) const GREETINGS: [&str; 4] = [
    "Goedemorgen, u spreekt met de digitale assistent. Hoe kan ik u van dienst zijn?",
    "Hallo, welkom. Dit is onze automatische assistent. Waarmee kan ik u helpen?",
    "Goed dat u belt. Ik ben hier om u te helpen. Wat is uw vraag?",
    "Hartelijk welkom. Wat kan ik voor u doen vandaag?",
];

pub(crate) const CLOSINGS: [&str; 4] = [
    "Dank u voor uw bellen. Wij helpen u snel. Tot ziens!",
    "Bedankt voor uw geduld. Een collega zal u binnenkort contacteren.",
    "Prima, uw zaak is geregistreerd. Wij nemen contact met u op.",
    "Dank u wel. Veel sterkte, en wij spreken snel!",
];

/// Re-ask used while no name has been given
pub const ASK_NAME: &str = "Mag ik eerst uw naam vragen alstublieft?";

/// Reply to gratitude once the intake is complete
pub const CLOSING_ACKNOWLEDGEMENT: &str =
    "Prima. Wij zullen dit oppakken en u binnenkort contacteren. Bedankt voor het bellen!";

/// Reply to anything else once the intake is complete
pub const FORWARDED_ACKNOWLEDGEMENT: &str =
    "Begrepen. Ik zal dit doorgeven aan het juiste team. Nog iets waarmee ik kan helpen?";

const NAME_CUES: [&str; 3] = ["mijn naam", "heet", "ben"];
const GRATITUDE_CUES: [&str; 5] = ["dank", "bedankt", "fijn", "prima", "goed"];

/// Position in the intake script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntakeStep {
    /// Waiting for the caller to introduce themselves
    #[default]
    AwaitingName,
    /// Name captured, waiting for the issue
    AwaitingIssue,
    /// Intake complete
    Acknowledging,
}

impl IntakeStep {
    /// Numeric step counter (0, 1, 2)
    pub fn index(&self) -> u8 {
        match self {
            Self::AwaitingName => 0,
            Self::AwaitingIssue => 1,
            Self::Acknowledging => 2,
        }
    }
}

/// Structured persona state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessIntake {
    pub step: IntakeStep,
    pub customer_name: Option<String>,
    pub issue_description: Option<String>,
}

impl DialogueScript for BusinessIntake {
    const PERSONA: Persona = Persona::Business;

    fn greeting(rng: &mut dyn RngCore) -> &'static str {
        pick(rng, &GREETINGS)
    }

    fn respond(&self, user_text: &str, _rng: &mut dyn RngCore) -> (String, Self) {
        let lowered = user_text.to_lowercase();

        match self.step {
            IntakeStep::AwaitingName => {
                if contains_any(&lowered, &NAME_CUES) {
                    let reply = format!(
                        "Dank u wel. Ik heb opgenoteerd dat u {user_text} bent. Waar kan ik u mee helpen?"
                    );
                    let next = Self {
                        step: IntakeStep::AwaitingIssue,
                        customer_name: Some(user_text.to_string()),
                        ..self.clone()
                    };
                    (reply, next)
                } else {
                    (ASK_NAME.to_string(), self.clone())
                }
            }
            IntakeStep::AwaitingIssue => {
                let reply = format!(
                    "Dank u voor deze informatie. Ik begrijp dat het gaat om: {user_text}. Wat zou u willen dat wij doen?"
                );
                let next = Self {
                    step: IntakeStep::Acknowledging,
                    issue_description: Some(user_text.to_string()),
                    ..self.clone()
                };
                (reply, next)
            }
            IntakeStep::Acknowledging => {
                let reply = if contains_any(&lowered, &GRATITUDE_CUES) {
                    CLOSING_ACKNOWLEDGEMENT
                } else {
                    FORWARDED_ACKNOWLEDGEMENT
                };
                (reply.to_string(), self.clone())
            }
        }
    }

    fn closing(rng: &mut dyn RngCore) -> &'static str {
        pick(rng, &CLOSINGS)
    }
}
