use async_trait::async_trait;
use sevakendra::agents::{FanOutCoordinator, SpecialistInvoker, SynthesisInvoker};
use sevakendra::llm::TextGenerator;
use sevakendra::{
    ConsultationPipeline, NO_DIAGNOSIS_GENERATED, Report, SpecialistRole,
};
use std::sync::Arc;
use std::time::Duration;

struct Delayed {
    reply: Option<&'static str>,
}

#[async_trait]
impl TextGenerator for Delayed {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let delay = rand::random_range(0..25u64);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        match self.reply {
            Some(reply) => Ok(reply.to_string()),
            None => Err(anyhow::anyhow!("upstream rejected prompt of {} chars", prompt.len())),
        }
    }
}

struct Echo;

#[async_trait]
impl TextGenerator for Echo {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(prompt.to_string())
    }
}

fn specialists(replies: [Option<&'static str>; 3]) -> Vec<SpecialistInvoker> {
    SpecialistRole::ALL
        .into_iter()
        .zip(replies)
        .map(|(role, reply)| SpecialistInvoker::new(role, Arc::new(Delayed { reply })))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hemoglobin_report_reaches_synthesis_with_every_specialist() {
    let dir = tempfile::tempdir().unwrap();
    let result_path = dir.path().join("results").join("final_diagnosis.txt");
    let pipeline = ConsultationPipeline::new(
        specialists([Some("CARD_OK"), Some("PSY_OK"), Some("PULM_OK")]),
        SynthesisInvoker::new(Arc::new(Echo)),
        FanOutCoordinator::new(3),
        &result_path,
    );

    for _ in 0..10 {
        let outcome = pipeline.run(&Report::new("Hemoglobin 10 g/dL")).await;

        assert!(outcome.diagnosis.contains("Cardiologist Report: CARD_OK"));
        assert!(outcome.diagnosis.contains("Psychologist Report: PSY_OK"));
        assert!(outcome.diagnosis.contains("Pulmonologist Report: PULM_OK"));
        assert_eq!(
            std::fs::read_to_string(&result_path).unwrap(),
            outcome.diagnosis
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn total_failure_degrades_to_literal() {
    struct Down;

    #[async_trait]
    impl TextGenerator for Down {
        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("502 bad gateway"))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let result_path = dir.path().join("final_diagnosis.txt");
    let pipeline = ConsultationPipeline::new(
        specialists([None, None, None]),
        SynthesisInvoker::new(Arc::new(Down)),
        FanOutCoordinator::new(2),
        &result_path,
    );

    let outcome = pipeline.run(&Report::new("Hemoglobin 10 g/dL")).await;

    let expected = format!("### Final Diagnosis:\n\n{NO_DIAGNOSIS_GENERATED}");
    assert_eq!(outcome.diagnosis, expected);
    assert_eq!(outcome.findings.absent_roles(), SpecialistRole::ALL.to_vec());
    assert_eq!(std::fs::read_to_string(&result_path).unwrap(), expected);
}
