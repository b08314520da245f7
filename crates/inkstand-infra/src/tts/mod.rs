//! Text-to-speech synthesizers.
//!
//! [`elevenlabs::ElevenLabsSynthesizer`] calls the provider directly;
//! [`mediated::MediatedSynthesizer`] goes through the text-to-speech
//! function served by `inkstand serve`. [`build_audio_generator`] wires them
//! according to the configured strategy.

pub mod elevenlabs;
pub mod mediated;

use inkstand_core::generate::audio::{AudioGenerator, BoxSpeechSynthesizer};
use inkstand_types::config::{AudioStrategy, StudioConfig};

use self::elevenlabs::ElevenLabsSynthesizer;
use self::mediated::MediatedSynthesizer;

/// Audio generator for `config.audio.strategy`. The mediated strategy falls
/// back to the direct synthesizer.
pub fn build_audio_generator(client: &reqwest::Client, config: &StudioConfig) -> AudioGenerator {
    let direct = ElevenLabsSynthesizer::from_config(client.clone(), &config.elevenlabs);
    match config.audio.strategy {
        AudioStrategy::Direct => AudioGenerator::new(BoxSpeechSynthesizer::new(direct)),
        AudioStrategy::Mediated => {
            let mediated = MediatedSynthesizer::new(client.clone(), config.audio.function_url.clone());
            AudioGenerator::new(BoxSpeechSynthesizer::new(mediated))
                .with_fallback(BoxSpeechSynthesizer::new(direct))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selects_primary() {
        let client = reqwest::Client::new();
        let mut config = StudioConfig::default();
        assert_eq!(build_audio_generator(&client, &config).primary_name(), "elevenlabs");

        config.audio.strategy = AudioStrategy::Mediated;
        assert_eq!(build_audio_generator(&client, &config).primary_name(), "mediated");
    }
}
